//! Client-server endpoints under `/_matrix/client/r0`.

mod account;
mod login;
mod profile;
mod register;
mod to_device;

use serde::{Deserialize, Serialize};

pub use account::{Logout, WhoAmI, WhoAmIResponse};
pub use login::{GetLoginFlows, Login, LoginFlow, LoginFlows, LoginResponse};
pub use profile::{DisplayName, GetDisplayName};
pub use register::{Register, RegisterBody, RegisterKind, RegisterResponse};
pub use to_device::{ALL_DEVICES, SendToDevice, ToDeviceMessages};

/// Response of endpoints that answer with `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResponse {}
