//! 装饰器链构建
//!
//! 分两步：先把开放泛型装饰器按候选类型展开为封闭声明，
//! 再按目标服务类型分组并按 `order` 升序排列。两步都是纯函数。

use di_abstractions::{CandidateType, DecoratorDescriptor};
use di_common::TypeKey;

/// 单个服务类型的装饰器链，由内向外排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorChain {
    pub service: TypeKey,
    pub decorators: Vec<DecoratorDescriptor>,
}

impl DecoratorChain {
    /// 对外可见的最外层装饰器
    pub fn outermost(&self) -> Option<&DecoratorDescriptor> {
        self.decorators.last()
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

/// 装饰器链构建器
pub struct DecoratorChainBuilder;

impl DecoratorChainBuilder {
    /// 展开开放泛型装饰器
    ///
    /// 对每个以开放目标的某个封闭形式注册的候选类型，用同一组泛型实参
    /// 生成封闭的装饰器声明。封闭声明原样保留。
    pub fn expand_open(
        decorators: &[DecoratorDescriptor],
        candidates: &[CandidateType],
    ) -> Vec<DecoratorDescriptor> {
        let mut expanded: Vec<DecoratorDescriptor> = Vec::new();
        for decorator in decorators {
            if !decorator.open {
                push_unique(&mut expanded, decorator.clone());
                continue;
            }
            for candidate in candidates {
                let services = std::iter::once(&candidate.implementation).chain(candidate.interfaces.iter());
                for service in services {
                    if let Some(args) = decorator.target.bind(service) {
                        push_unique(&mut expanded, Self::close(decorator, service, &args));
                    }
                }
            }
        }
        expanded
    }

    fn close(decorator: &DecoratorDescriptor, service: &TypeKey, args: &[TypeKey]) -> DecoratorDescriptor {
        DecoratorDescriptor {
            decorator: decorator.decorator.substitute(args),
            target: service.clone(),
            order: decorator.order,
            open: false,
            parameters: decorator.parameters.iter().map(|p| p.substitute(args)).collect(),
            constructor: decorator.constructor,
            assembly: decorator.assembly.clone(),
        }
    }

    /// 构建装饰器链
    ///
    /// 服务类型按首次出现的顺序排列；链内按 `order` 升序，相同时保持声明顺序。
    pub fn build_chains(
        decorators: &[DecoratorDescriptor],
        candidates: &[CandidateType],
    ) -> Vec<DecoratorChain> {
        let mut chains: Vec<DecoratorChain> = Vec::new();
        for decorator in Self::expand_open(decorators, candidates) {
            match chains.iter_mut().find(|c| c.service == decorator.target) {
                Some(chain) => chain.decorators.push(decorator),
                None => chains.push(DecoratorChain {
                    service: decorator.target.clone(),
                    decorators: vec![decorator],
                }),
            }
        }
        for chain in &mut chains {
            chain.decorators.sort_by_key(|d| d.order);
        }
        chains
    }
}

fn push_unique(list: &mut Vec<DecoratorDescriptor>, decorator: DecoratorDescriptor) {
    let duplicate = list
        .iter()
        .any(|d| d.decorator == decorator.decorator && d.target == decorator.target);
    if !duplicate {
        list.push(decorator);
    }
}
