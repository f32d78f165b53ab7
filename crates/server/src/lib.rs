pub mod deployment;
pub mod error;
pub mod middleware;
pub mod routes;

pub use deployment::LocalDeployment as DeploymentImpl;
