//! Declarative service interfaces bound to a client factory.

use crate::ClientFactory;
use std::sync::Arc;

/// One remote operation of a service interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Trait method name.
    pub name: &'static str,
    /// HTTP verb, upper case.
    pub verb: &'static str,
    /// Path template relative to the base URL.
    pub path: &'static str,
}

/// Static description of a service interface, emitted by `#[http_service]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Trait name.
    pub type_name: &'static str,
    /// Module the trait is declared in.
    pub module_path: &'static str,
    /// Declared logical name.
    pub name: Option<&'static str>,
    /// Declared registry name.
    pub registry: Option<&'static str>,
    /// One shared instance (`true`) or a fresh proxy per resolve.
    pub singleton: bool,
    /// Remote operations in declaration order.
    pub methods: &'static [MethodDescriptor],
}

impl ServiceDescriptor {
    /// Name the service is registered under: the declared name, else the
    /// fully qualified trait path, so same-named traits in different modules
    /// never collide.
    pub fn service_name(&self) -> String {
        match self.name {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.qualified_name(),
        }
    }

    /// Fully qualified trait path.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.module_path, self.type_name)
    }

    /// Look up an operation by method name.
    pub fn method(&self, name: &str) -> Option<&'static MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A service interface that can be implemented by a proxy over a [`ClientFactory`].
///
/// Implemented for `dyn Trait` by the `#[http_service]` attribute; not meant to
/// be implemented by hand.
pub trait HttpService: Send + Sync + 'static {
    /// Static description of the interface.
    const DESCRIPTOR: ServiceDescriptor;

    /// Create a proxy that delegates every call through `factory`.
    fn bind(factory: ClientFactory) -> Arc<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const METHODS: &[MethodDescriptor] = &[
        MethodDescriptor {
            name: "add",
            verb: "GET",
            path: "calculate/add",
        },
        MethodDescriptor {
            name: "store",
            verb: "POST",
            path: "results",
        },
    ];

    fn descriptor(name: Option<&'static str>) -> ServiceDescriptor {
        ServiceDescriptor {
            type_name: "CalculatorClient",
            module_path: "app::clients",
            name,
            registry: None,
            singleton: true,
            methods: METHODS,
        }
    }

    #[test]
    fn test_service_name_falls_back_to_qualified_name() {
        assert_eq!(
            descriptor(None).service_name(),
            "app::clients::CalculatorClient"
        );
        assert_eq!(
            descriptor(Some(" ")).service_name(),
            "app::clients::CalculatorClient"
        );
        assert_eq!(descriptor(Some("calculator")).service_name(), "calculator");
    }

    #[test]
    fn test_method_lookup() {
        let descriptor = descriptor(None);
        assert_eq!(descriptor.method("store").unwrap().verb, "POST");
        assert!(descriptor.method("missing").is_none());
        assert_eq!(descriptor.qualified_name(), "app::clients::CalculatorClient");
    }
}
