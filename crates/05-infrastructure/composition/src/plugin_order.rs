//! 插件排序

use di_abstractions::PluginDescriptor;
use di_common::TypeKey;

/// 插件排序器
///
/// 先按 `order` 升序，再按实现类型名称序数比较，结果与发现策略和运行次数无关。
pub struct PluginOrderer;

impl PluginOrderer {
    pub fn order(plugins: &[PluginDescriptor]) -> OrderedPlugins {
        let mut ordered = plugins.to_vec();
        ordered.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.implementation.to_string().cmp(&b.implementation.to_string()))
        });
        OrderedPlugins { plugins: ordered }
    }
}

/// 已排序的插件序列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedPlugins {
    plugins: Vec<PluginDescriptor>,
}

impl OrderedPlugins {
    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// 实现了指定接口的插件，保持顺序
    pub fn implementing(&self, interface: &TypeKey) -> Vec<&PluginDescriptor> {
        self.plugins.iter().filter(|p| p.implements(interface)).collect()
    }

    /// 带有指定标注的插件，保持顺序
    pub fn with_attribute(&self, attribute: &str) -> Vec<&PluginDescriptor> {
        self.plugins.iter().filter(|p| p.has_attribute(attribute)).collect()
    }

    /// 实现类型名称序列
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.implementation.to_string()).collect()
    }
}

impl IntoIterator for OrderedPlugins {
    type Item = PluginDescriptor;
    type IntoIter = std::vec::IntoIter<PluginDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.plugins.into_iter()
    }
}
