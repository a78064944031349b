//! 动态发现：在组合时检查类型元数据

use crate::constructor::ConstructorResolver;
use crate::qualifier::{DecoratorTarget, TypeDecision, TypeQualifier, TypeRole};
use di_abstractions::{
    Assembly, BindingSet, CandidateType, CatalogFacts, DecoratorDescriptor, Discovery,
    DiscoveryRequest, InterceptorActivation, InterceptorDescriptor, PluginDescriptor,
    RegistrationMode, TypeCatalogProvider, TypeDescriptor,
};
use di_common::{
    CompositionError, CompositionResult, Diagnostic, DiagnosticCode, TypeKey,
};
use tracing::{debug, info};

/// 基于类型元数据的目录提供者
#[derive(Debug, Clone, Default)]
pub struct ReflectionCatalogProvider;

impl ReflectionCatalogProvider {
    pub fn new() -> Self {
        Self
    }

    fn scan_assembly(
        &self,
        assembly: &Assembly,
        request: &DiscoveryRequest,
        facts: &mut CatalogFacts,
    ) -> CompositionResult<()> {
        let foreign = request.is_foreign(&assembly.name);
        let mut hidden_plugins: Vec<String> = Vec::new();

        for descriptor in &assembly.types {
            let decision = TypeQualifier::evaluate(descriptor)?;
            let accessible = descriptor.is_public() || !foreign || assembly.participates;

            if let Some(shape) = &decision.plugin {
                if accessible {
                    facts.plugins.push(PluginDescriptor {
                        implementation: descriptor.key.clone(),
                        interfaces: descriptor.interface_keys(),
                        attributes: shape.attributes.clone(),
                        order: shape.order,
                        assembly: assembly.name.clone(),
                    });
                } else {
                    hidden_plugins.push(descriptor.key.to_string());
                }
            }

            match decision.role {
                TypeRole::Candidate | TypeRole::Decorator if !accessible => {
                    facts.diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticCode::InaccessibleType,
                            format!(
                                "{} 满足注册条件，但它是外部程序集 {} 的非公开类型，已跳过",
                                descriptor.key, assembly.name
                            ),
                        )
                        .with_type(descriptor.key.to_string())
                        .with_assembly(assembly.name.clone()),
                    );
                }
                TypeRole::Candidate => {
                    self.add_candidate(descriptor, &decision, assembly, request, facts)?;
                }
                TypeRole::Decorator => {
                    for target in &decision.decorates {
                        let decorator = Self::decorator(descriptor, target, assembly)?;
                        facts.decorators.push(decorator);
                    }
                }
                _ => {}
            }
        }

        if !hidden_plugins.is_empty() {
            facts.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::MissingParticipationContract,
                    format!(
                        "外部程序集 {} 包含插件形态的内部类型 [{}]，但未声明参与发现，这些插件不会被注册",
                        assembly.name,
                        hidden_plugins.join(", ")
                    ),
                )
                .with_assembly(assembly.name.clone()),
            );
        }

        Ok(())
    }

    fn add_candidate(
        &self,
        descriptor: &TypeDescriptor,
        decision: &TypeDecision,
        assembly: &Assembly,
        request: &DiscoveryRequest,
        facts: &mut CatalogFacts,
    ) -> CompositionResult<()> {
        let selection = ConstructorResolver::select(
            descriptor,
            decision.deferred.as_deref(),
            decision.generate_factory,
        )?;
        let Some(selection) = selection else {
            facts.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::NoInjectableConstructor,
                    format!("{} 没有可注入的公开构造函数", descriptor.key),
                )
                .with_type(descriptor.key.to_string())
                .with_assembly(assembly.name.clone()),
            );
            return Ok(());
        };

        let mode = if selection.has_runtime_parameters() {
            RegistrationMode::GeneratedFactory
        } else {
            RegistrationMode::Direct
        };
        let lifetime = decision.lifetime.unwrap_or_default();

        debug!(
            "发现候选类型: {} ({}), 接口: {:?}",
            descriptor.key,
            lifetime,
            decision.interfaces.iter().map(ToString::to_string).collect::<Vec<_>>()
        );

        if mode == RegistrationMode::GeneratedFactory && !decision.interception.is_empty() {
            facts.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::InterceptionNotApplied,
                    format!("{} 以生成工厂注册，其拦截声明被忽略", descriptor.key),
                )
                .with_type(descriptor.key.to_string())
                .with_assembly(assembly.name.clone()),
            );
        } else if !decision.interception.is_empty() {
            let mut interceptor = InterceptorDescriptor {
                intercepted: descriptor.key.clone(),
                interfaces: decision.interfaces.clone(),
                interceptors: decision.interception.interceptors.clone(),
                methods: decision.interception.methods.clone(),
                lifetime,
                activations: Vec::new(),
            };
            for interceptor_type in interceptor.all_interceptors() {
                let activation = Self::interceptor_activation(&descriptor.key, &interceptor_type, request)?;
                interceptor.activations.push(activation);
            }
            facts.interceptors.push(interceptor);
        }

        facts.candidates.push(CandidateType {
            implementation: descriptor.key.clone(),
            interfaces: decision.interfaces.clone(),
            lifetime,
            parameters: selection.parameters,
            keys: decision.keys.clone(),
            assembly: assembly.name.clone(),
            constructor: selection.index,
            mode,
            source: descriptor.source.clone(),
        });
        Ok(())
    }

    /// 拦截器类型在请求的全部程序集中查找
    fn interceptor_activation(
        intercepted: &TypeKey,
        interceptor: &TypeKey,
        request: &DiscoveryRequest,
    ) -> CompositionResult<InterceptorActivation> {
        let descriptor = request
            .assemblies
            .iter()
            .find_map(|assembly| assembly.find(interceptor))
            .ok_or_else(|| {
                CompositionError::invalid_directive(
                    intercepted.to_string(),
                    format!("拦截器 {} 不在参与发现的程序集中", interceptor),
                )
            })?;

        if TypeQualifier::evaluate(descriptor)?.role != TypeRole::Interceptor {
            return Err(CompositionError::invalid_directive(
                intercepted.to_string(),
                format!("{} 没有实现拦截器契约", interceptor),
            ));
        }

        let selection = ConstructorResolver::select(descriptor, None, false)?.ok_or_else(|| {
            CompositionError::invalid_directive(
                intercepted.to_string(),
                format!("拦截器 {} 没有可注入的构造函数", interceptor),
            )
        })?;

        Ok(InterceptorActivation {
            interceptor: interceptor.clone(),
            constructor: selection.index,
            parameters: selection.parameters,
        })
    }

    fn decorator(
        descriptor: &TypeDescriptor,
        target: &DecoratorTarget,
        assembly: &Assembly,
    ) -> CompositionResult<DecoratorDescriptor> {
        if !descriptor.implements_interface(&target.target) {
            return Err(CompositionError::invalid_directive(
                descriptor.key.to_string(),
                format!("装饰器没有实现被装饰的服务 {}", target.target),
            ));
        }

        let selection = ConstructorResolver::select(descriptor, None, false)?.ok_or_else(|| {
            CompositionError::invalid_directive(
                descriptor.key.to_string(),
                "装饰器没有可注入的构造函数",
            )
        })?;

        let decorator = DecoratorDescriptor {
            decorator: descriptor.key.clone(),
            target: target.target.clone(),
            order: target.order,
            open: target.open,
            parameters: selection.parameters,
            constructor: selection.index,
            assembly: assembly.name.clone(),
        };
        if decorator.inner_parameter().is_none() {
            return Err(CompositionError::invalid_directive(
                descriptor.key.to_string(),
                format!("装饰器构造函数缺少类型为 {} 的内层参数", target.target),
            ));
        }
        Ok(decorator)
    }
}

impl TypeCatalogProvider for ReflectionCatalogProvider {
    fn name(&self) -> &str {
        "reflection"
    }

    fn discover(&self, request: &DiscoveryRequest) -> CompositionResult<Discovery> {
        info!("开始动态发现，程序集: {:?}", request.assembly_names());

        let mut facts = CatalogFacts::new();
        for assembly in &request.assemblies {
            self.scan_assembly(assembly, request, &mut facts)?;
        }
        let bindings = BindingSet::from_assemblies(request.assemblies.iter().map(|a| &**a));

        info!(
            "动态发现完成: 候选类型 {} 个, 插件 {} 个, 装饰器 {} 个, 拦截类型 {} 个",
            facts.candidates.len(),
            facts.plugins.len(),
            facts.decorators.len(),
            facts.interceptors.len()
        );
        Ok(Discovery::new(facts, bindings))
    }
}
