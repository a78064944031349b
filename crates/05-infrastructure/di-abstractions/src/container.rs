//! 容器抽象接口
//!
//! 组合核心只产生注册指令，实例缓存与作用域管理由外部容器负责。

use crate::registry::{DecoratorFactory, RegistrationInfo, ServiceRegistration};
use di_common::{ServiceKey, TypeKey};

/// 服务集合 trait
///
/// 接收注册指令，并支持对某服务类型的全部已有注册进行装饰。
pub trait ServiceCollection {
    /// 添加注册
    fn add(&mut self, registration: ServiceRegistration);

    /// 装饰 `service` 的全部已有注册（包括键控注册），返回被装饰的注册数量
    ///
    /// 每个注册独立包裹自己的原始实例，多个注册不会合并为一个。
    fn decorate(&mut self, service: &TypeKey, decorator: DecoratorFactory) -> usize;

    /// 检查是否存在注册
    fn contains(&self, key: &ServiceKey) -> bool;

    /// 全部注册摘要，按注册顺序
    fn registrations(&self) -> Vec<RegistrationInfo>;

    /// 注册数量
    fn len(&self) -> usize {
        self.registrations().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
