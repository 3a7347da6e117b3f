// vSphere Web Services (vim25 SOAP) client
pub mod session;
pub mod soap;
pub mod xml;

pub use session::Session;
