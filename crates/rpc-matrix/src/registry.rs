use rpc_core::{PayloadRegistry, RegistryError};

use crate::models::{AuthenticationData, LoginBody, StartContent, UserIdentifier};

/// Registry holding every payload family this crate defines.
pub fn standard_registry() -> Result<PayloadRegistry, RegistryError> {
    Ok(PayloadRegistry::builder()
        .register::<LoginBody>()?
        .register::<UserIdentifier>()?
        .register::<AuthenticationData>()?
        .register::<StartContent>()?
        .build())
}
