//! 组合校验
//!
//! 只检查发现事实本身，结果均为诊断。运行时才注册的服务不在事实中，
//! 因此缺失的键控依赖只记为提示。

use di_abstractions::{
    CandidateType, CatalogFacts, ConstructorParameter, ParameterShape, ParameterSource,
    RegistrationMode,
};
use di_common::{Diagnostic, DiagnosticCode, Diagnostics, Lifetime, ServiceKey};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// 组合校验器
pub struct CompositionValidator<'a> {
    facts: &'a CatalogFacts,
    /// 服务标识到提供它的候选类型下标及注册生命周期
    providers: HashMap<ServiceKey, Vec<(usize, Lifetime)>>,
}

impl<'a> CompositionValidator<'a> {
    pub fn new(facts: &'a CatalogFacts) -> Self {
        let mut providers: HashMap<ServiceKey, Vec<(usize, Lifetime)>> = HashMap::new();
        for (index, candidate) in facts.candidates.iter().enumerate() {
            for signature in candidate.signatures() {
                providers
                    .entry(ServiceKey::with_key(signature.service, signature.key))
                    .or_default()
                    .push((index, signature.lifetime));
            }
        }
        Self { facts, providers }
    }

    /// 执行全部检查
    pub fn validate(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        self.check_keyed_dependencies(&mut diagnostics);
        self.check_captive_dependencies(&mut diagnostics);
        self.check_cycles(&mut diagnostics);
        debug!("组合校验完成: {} 条诊断", diagnostics.len());
        diagnostics
    }

    fn check_keyed_dependencies(&self, diagnostics: &mut Diagnostics) {
        for candidate in &self.facts.candidates {
            for parameter in candidate
                .parameters
                .iter()
                .filter(|p| p.is_keyed() && p.requires_registration())
            {
                let key = parameter.service_key();
                if !self.providers.contains_key(&key) {
                    diagnostics.push(
                        Diagnostic::info(
                            DiagnosticCode::UnresolvedKeyedDependency,
                            format!(
                                "{} 的参数 {} 依赖 {}，发现结果中没有对应注册",
                                candidate.implementation, parameter.name, key
                            ),
                        )
                        .with_type(candidate.implementation.to_string())
                        .with_assembly(candidate.assembly.clone()),
                    );
                }
            }
        }
    }

    fn check_captive_dependencies(&self, diagnostics: &mut Diagnostics) {
        for candidate in &self.facts.candidates {
            if candidate.mode != RegistrationMode::Direct {
                continue;
            }
            for parameter in candidate.parameters.iter().filter(|p| resolves_from_container(p)) {
                let captured = self
                    .providers_of(parameter)
                    .into_iter()
                    .find(|(_, lifetime)| candidate.lifetime.captures(*lifetime));
                if let Some((dependency, lifetime)) = captured {
                    diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticCode::LifetimeMismatch,
                            format!(
                                "{} ({}) 依赖 {} ({})，作用域实例会被长生命周期服务捕获",
                                candidate.implementation,
                                candidate.lifetime,
                                dependency.implementation,
                                lifetime
                            ),
                        )
                        .with_type(candidate.implementation.to_string())
                        .with_assembly(candidate.assembly.clone()),
                    );
                }
            }
        }
    }

    fn check_cycles(&self, diagnostics: &mut Diagnostics) {
        let count = self.facts.candidates.len();
        let edges: Vec<Vec<usize>> = self
            .facts
            .candidates
            .iter()
            .map(|candidate| {
                let mut targets: Vec<usize> = Vec::new();
                for parameter in candidate
                    .parameters
                    .iter()
                    .filter(|p| resolves_from_container(p) && p.shape != ParameterShape::Lazy)
                {
                    for (index, _) in self.providers.get(&parameter.service_key()).into_iter().flatten() {
                        if !targets.contains(index) {
                            targets.push(*index);
                        }
                    }
                }
                targets
            })
            .collect();

        let mut state = vec![Visit::New; count];
        let mut stack: Vec<usize> = Vec::new();
        let mut reported: BTreeSet<Vec<usize>> = BTreeSet::new();
        for start in 0..count {
            if state[start] == Visit::New {
                self.visit(start, &edges, &mut state, &mut stack, &mut reported, diagnostics);
            }
        }
    }

    fn visit(
        &self,
        node: usize,
        edges: &[Vec<usize>],
        state: &mut [Visit],
        stack: &mut Vec<usize>,
        reported: &mut BTreeSet<Vec<usize>>,
        diagnostics: &mut Diagnostics,
    ) {
        state[node] = Visit::Active;
        stack.push(node);

        for &next in &edges[node] {
            match state[next] {
                Visit::New => self.visit(next, edges, state, stack, reported, diagnostics),
                Visit::Active => {
                    let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                    let cycle: Vec<usize> = stack[start..].to_vec();
                    let mut members = cycle.clone();
                    members.sort_unstable();
                    if reported.insert(members) {
                        diagnostics.push(self.cycle_diagnostic(&cycle));
                    }
                }
                Visit::Done => {}
            }
        }

        stack.pop();
        state[node] = Visit::Done;
    }

    fn cycle_diagnostic(&self, cycle: &[usize]) -> Diagnostic {
        let candidates = &self.facts.candidates;
        let chain = cycle
            .iter()
            .chain(cycle.first())
            .map(|&i| candidates[i].implementation.to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        let first = &candidates[cycle[0]];
        Diagnostic::warning(
            DiagnosticCode::CircularDependency,
            format!("构造依赖成环: {}", chain),
        )
        .with_type(first.implementation.to_string())
        .with_assembly(first.assembly.clone())
    }

    fn providers_of(&self, parameter: &ConstructorParameter) -> Vec<(&CandidateType, Lifetime)> {
        self.providers
            .get(&parameter.service_key())
            .into_iter()
            .flatten()
            .map(|&(i, lifetime)| (&self.facts.candidates[i], lifetime))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

fn resolves_from_container(parameter: &ConstructorParameter) -> bool {
    parameter.source == ParameterSource::Service
}
