pub mod campaign_repo;
pub mod dataset_repo;
pub mod generator_repo;
pub mod response_repo;
pub mod response_set_repo;
pub mod survey_repo;
pub mod user_repo;

pub use campaign_repo::CampaignRepository;
pub use dataset_repo::DatasetRepository;
pub use generator_repo::{GeneratorRepository, GeneratorStatus, NewGenerator};
pub use response_repo::{NewResponse, ResponseRepository};
pub use response_set_repo::{NewResponseSet, ResponseSetRepository};
pub use survey_repo::CatalogRepository;
pub use user_repo::{NewUser, UserRepository};
