pub mod cpf;
pub mod masking;
pub mod resume;
pub mod time;
