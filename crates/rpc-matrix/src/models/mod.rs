//! Matrix payload families encoded as discriminated JSON objects.

mod auth;
mod identifier;
mod login;
mod verification;

pub use auth::{
    AuthCommon, AuthFlow, AuthenticationData, DummyAuth, PasswordAuth, RecaptchaAuth, TokenAuth,
    UserInteractiveAuth,
};
pub use identifier::{MatrixUserId, PhoneNumber, ThirdPartyId, UserIdentifier};
pub use login::{LoginBody, LoginCommon, PasswordLogin, TokenLogin};
pub use verification::{
    ReciprocateV1Content, SasV1Content, StartContent, VERIFICATION_START_EVENT,
    VerificationCommon, new_transaction_id,
};
