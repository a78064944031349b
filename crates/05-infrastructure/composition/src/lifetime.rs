//! 生命周期分类

use di_abstractions::{TypeDescriptor, TypeShape};
use di_common::{CompositionError, CompositionResult, Directive, Lifetime};

/// 生命周期分类器
pub struct LifetimeClassifier;

impl LifetimeClassifier {
    /// 判定类型的生命周期
    ///
    /// 默认单例；显式声明互斥，出现多个声明（包括重复声明）即为配置错误。
    /// 结构上不可实例化的类型返回 `None`。
    pub fn classify(descriptor: &TypeDescriptor) -> CompositionResult<Option<Lifetime>> {
        let declared: Vec<Lifetime> = descriptor
            .directives
            .iter()
            .filter_map(|d| match d {
                Directive::Lifetime(lifetime) => Some(*lifetime),
                _ => None,
            })
            .collect();

        if declared.len() > 1 {
            return Err(CompositionError::AmbiguousLifetime {
                type_name: descriptor.key.to_string(),
                declared: declared.iter().map(ToString::to_string).collect(),
            });
        }

        if !Self::is_instantiable(descriptor.shape) {
            return Ok(None);
        }

        Ok(Some(declared.first().copied().unwrap_or_default()))
    }

    /// 形态是否可以产生有身份的实例
    pub fn is_instantiable(shape: TypeShape) -> bool {
        matches!(shape, TypeShape::Class)
    }
}
