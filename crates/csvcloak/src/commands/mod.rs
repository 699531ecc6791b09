pub mod default;
pub mod inspect;
