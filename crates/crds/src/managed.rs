//! Managed resource abstraction
//!
//! Gives the controller uniform access to the envelope shared by every Azure
//! managed resource, independent of the resource kind.

use crate::common::{
    Condition, ConditionType, ConditionedStatus, DeletionPolicy, ResourceSpec, SecretReference,
};
use kube::Resource;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Annotation holding the name of the resource in Azure
pub const EXTERNAL_NAME_ANNOTATION: &str = "crossplane.io/external-name";

/// Status of a managed resource
pub trait ManagedStatus: Default + Clone + Debug + PartialEq + Serialize + Send + Sync {
    fn conditioned(&self) -> &ConditionedStatus;
    fn conditioned_mut(&mut self) -> &mut ConditionedStatus;
}

/// A cluster-scoped custom resource representing an Azure resource.
pub trait Managed:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Status: ManagedStatus;

    /// Envelope fields of the spec
    fn resource_spec(&self) -> &ResourceSpec;

    /// Current status, if any has been written
    fn managed_status(&self) -> Option<&Self::Status>;

    /// Mutable status, initialised to its default when absent
    fn managed_status_mut(&mut self) -> &mut Self::Status;

    fn conditions(&self) -> &[Condition] {
        self.managed_status()
            .map(|s| s.conditioned().conditions.as_slice())
            .unwrap_or(&[])
    }

    fn condition(&self, type_: ConditionType) -> Option<&Condition> {
        self.conditions().iter().find(|c| c.type_ == type_)
    }

    fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        self.managed_status_mut().conditioned_mut().set_conditions(conditions);
    }

    /// Name of the resource in Azure: the external-name annotation, or the object name.
    fn external_name(&self) -> String {
        let meta = self.meta();
        meta.annotations
            .as_ref()
            .and_then(|a| a.get(EXTERNAL_NAME_ANNOTATION))
            .filter(|name| !name.is_empty())
            .cloned()
            .or_else(|| meta.name.clone())
            .unwrap_or_default()
    }

    fn deletion_policy(&self) -> DeletionPolicy {
        self.resource_spec().deletion_policy
    }

    fn provider_config_name(&self) -> &str {
        &self.resource_spec().provider_config_ref.name
    }

    fn connection_secret_ref(&self) -> Option<&SecretReference> {
        self.resource_spec().write_connection_secret_to_ref.as_ref()
    }

    fn is_being_deleted(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }
}

/// Implements [`Managed`] for a kind whose spec embeds `resource_spec` and whose
/// status embeds `conditioned`.
macro_rules! managed_resource {
    ($kind:ty, $status:ty) => {
        impl $crate::managed::ManagedStatus for $status {
            fn conditioned(&self) -> &$crate::common::ConditionedStatus {
                &self.conditioned
            }

            fn conditioned_mut(&mut self) -> &mut $crate::common::ConditionedStatus {
                &mut self.conditioned
            }
        }

        impl $crate::managed::Managed for $kind {
            type Status = $status;

            fn resource_spec(&self) -> &$crate::common::ResourceSpec {
                &self.spec.resource_spec
            }

            fn managed_status(&self) -> Option<&$status> {
                self.status.as_ref()
            }

            fn managed_status_mut(&mut self) -> &mut $status {
                self.status.get_or_insert_with(<$status>::default)
            }
        }
    };
}

/// Same as `managed_resource!` for a second kind sharing an already-registered status type.
macro_rules! managed_resource_shared_status {
    ($kind:ty, $status:ty) => {
        impl $crate::managed::Managed for $kind {
            type Status = $status;

            fn resource_spec(&self) -> &$crate::common::ResourceSpec {
                &self.spec.resource_spec
            }

            fn managed_status(&self) -> Option<&$status> {
                self.status.as_ref()
            }

            fn managed_status_mut(&mut self) -> &mut $status {
                self.status.get_or_insert_with(<$status>::default)
            }
        }
    };
}

pub(crate) use managed_resource;
pub(crate) use managed_resource_shared_status;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::{ResourceGroup, ResourceGroupSpec};
    use crate::common::ConditionReason;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn resource_group(annotations: Option<BTreeMap<String, String>>) -> ResourceGroup {
        ResourceGroup {
            metadata: ObjectMeta {
                name: Some("rg-object".to_string()),
                annotations,
                ..Default::default()
            },
            spec: ResourceGroupSpec {
                resource_spec: ResourceSpec::default(),
                location: "westeurope".to_string(),
                tags: None,
            },
            status: None,
        }
    }

    #[test]
    fn test_external_name_defaults_to_object_name() {
        assert_eq!(resource_group(None).external_name(), "rg-object");
    }

    #[test]
    fn test_external_name_from_annotation() {
        let mut annotations = BTreeMap::new();
        annotations.insert(EXTERNAL_NAME_ANNOTATION.to_string(), "rg-in-azure".to_string());
        assert_eq!(resource_group(Some(annotations)).external_name(), "rg-in-azure");
    }

    #[test]
    fn test_set_conditions_initialises_status() {
        let mut rg = resource_group(None);
        assert!(rg.conditions().is_empty());
        rg.set_conditions([Condition::creating()]);
        let ready = rg.condition(ConditionType::Ready).unwrap();
        assert_eq!(ready.reason, ConditionReason::Creating);
    }
}
