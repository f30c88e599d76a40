use crate::cas_cdt::{CasCdtTransform, CasCdtTransformer};
use crate::cdt::CdtMessageTransformer;
use crate::record::KafkaMessage;
use crate::tombstone::{TombstoneTransform, TombstoneTransformer};
use aerospike_connect_inbound::error::RegistryError;
use aerospike_connect_inbound::registry::TransformRegistry;

pub const CAS_CDT_TRANSFORM: &str = "cas-cdt-transform";
pub const CAS_CDT_TRANSFORMER: &str = "cas-cdt-transformer";
pub const TOMBSTONE_TRANSFORM: &str = "tombstone-transform";
pub const TOMBSTONE_TRANSFORMER: &str = "tombstone-transformer";
pub const CDT_TRANSFORMER: &str = "cdt-transformer";

pub fn build_registry() -> Result<TransformRegistry<KafkaMessage>, RegistryError> {
    log::debug!("Building registry");
    let mut registry: TransformRegistry<KafkaMessage> = TransformRegistry::new();

    // CAS
    registry.register_singleton(CAS_CDT_TRANSFORM, CasCdtTransform::new)?;
    registry.register_transformer_singleton(CAS_CDT_TRANSFORMER, CasCdtTransformer::new)?;

    // Tombstone
    registry.register_per_message(TOMBSTONE_TRANSFORM, TombstoneTransform::new)?;
    registry.register_transformer_per_message(TOMBSTONE_TRANSFORMER, TombstoneTransformer::new)?;

    // CDT
    registry.register_transformer_singleton(CDT_TRANSFORMER, CdtMessageTransformer::new)?;

    log::debug!("Registry build completed");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_samples() {
        let registry = build_registry().unwrap();
        assert_eq!(
            registry.classes(),
            vec![
                CAS_CDT_TRANSFORM,
                CAS_CDT_TRANSFORMER,
                CDT_TRANSFORMER,
                TOMBSTONE_TRANSFORM,
                TOMBSTONE_TRANSFORMER,
            ]
        );
    }
}
