pub mod answer;
pub mod certificate;
pub mod certificate_generator;
pub mod certification_campaign;
pub mod dataset;
pub mod question;
pub mod response;
pub mod response_set;
pub mod section;
pub mod survey;
pub mod user;

pub use certificate::Entity as Certificate;
pub use certificate_generator::Entity as CertificateGenerator;
pub use dataset::Entity as Dataset;
pub use response_set::Entity as ResponseSet;
pub use survey::Entity as Survey;
pub use user::Entity as User;
