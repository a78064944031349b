//! 构造函数选择与参数分类

use di_abstractions::{
    ConstructorDescriptor, ConstructorParameter, ParamCategory, ParamDescriptor, ParameterSource,
    TypeDescriptor,
};
use di_common::{CompositionError, CompositionResult, TypeKey};

/// 选中的构造函数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorSelection {
    /// 在声明顺序中的位置
    pub index: usize,
    pub parameters: Vec<ConstructorParameter>,
}

impl ConstructorSelection {
    /// 是否包含运行时参数
    pub fn has_runtime_parameters(&self) -> bool {
        self.parameters
            .iter()
            .any(|p| p.source == ParameterSource::Runtime)
    }
}

/// 构造函数解析器
pub struct ConstructorResolver;

impl ConstructorResolver {
    /// 选择构造函数
    ///
    /// - `deferred` 为显式参数类型列表时跳过启发式，直接按签名匹配，找不到即为指令错误
    /// - 否则只考虑公开构造函数，丢弃含有不可注入参数的构造函数
    ///   （`allow_runtime` 时运行时参数视为可接受），取参数最多者，并列取先声明者
    ///
    /// 没有可用构造函数时返回 `None`。
    pub fn select(
        descriptor: &TypeDescriptor,
        deferred: Option<&[TypeKey]>,
        allow_runtime: bool,
    ) -> CompositionResult<Option<ConstructorSelection>> {
        if let Some(signature) = deferred {
            let index = descriptor
                .constructors
                .iter()
                .position(|c| c.signature() == signature)
                .ok_or_else(|| {
                    CompositionError::invalid_directive(
                        descriptor.key.to_string(),
                        format!("没有与声明参数列表 {:?} 匹配的构造函数", render(signature)),
                    )
                })?;
            return Ok(Some(Self::selection(index, &descriptor.constructors[index])));
        }

        let mut best: Option<(usize, &ConstructorDescriptor)> = None;
        for (index, constructor) in descriptor.constructors.iter().enumerate() {
            if !constructor.is_public() || !Self::is_viable(constructor, allow_runtime) {
                continue;
            }
            let longer = best.map_or(true, |(_, current)| {
                constructor.params.len() > current.params.len()
            });
            if longer {
                best = Some((index, constructor));
            }
        }

        Ok(best.map(|(index, constructor)| Self::selection(index, constructor)))
    }

    fn is_viable(constructor: &ConstructorDescriptor, allow_runtime: bool) -> bool {
        constructor.params.iter().all(|p| {
            p.is_injectable() || (allow_runtime && p.category == ParamCategory::Runtime)
        })
    }

    fn selection(index: usize, constructor: &ConstructorDescriptor) -> ConstructorSelection {
        ConstructorSelection {
            index,
            parameters: constructor.params.iter().map(Self::classify).collect(),
        }
    }

    /// 参数分类，由参数元数据结构直接决定
    pub fn classify(param: &ParamDescriptor) -> ConstructorParameter {
        let source = match param.category {
            ParamCategory::Service => ParameterSource::Service,
            ParamCategory::Value => ParameterSource::DefaultValue,
            ParamCategory::Runtime => ParameterSource::Runtime,
        };
        ConstructorParameter {
            name: param.name.clone(),
            ty: param.ty.clone(),
            key: param.key.clone(),
            optional: param.optional || source == ParameterSource::DefaultValue,
            shape: param.shape,
            source,
        }
    }
}

fn render(signature: &[TypeKey]) -> Vec<String> {
    signature.iter().map(ToString::to_string).collect()
}
