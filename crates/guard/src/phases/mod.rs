mod generate;
mod self_heal;
mod validate;
mod verify;

pub use generate::GeneratePhase;
pub use self_heal::{heal_reason, SelfHealPhase};
pub use validate::ValidatePhase;
pub use verify::VerifyPhase;
