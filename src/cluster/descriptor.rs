//! Cluster creation request body
//!
//! Maps the handful of caller-supplied parameters (name, worker count,
//! worker hostnames) onto the provider's cluster resource, filling the
//! rest from [`ClusterDefaults`].

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine class used for master and workers unless configured otherwise
pub const DEFAULT_MACHINE_TYPE: &str = "n1-standard-4";

/// Boot disk size in GB
pub const DEFAULT_BOOT_DISK_SIZE_GB: u32 = 10;

/// Instance name given to the single master node
pub const DEFAULT_MASTER_INSTANCE_NAME: &str = "cluster-yarn-recsys-m";

/// Zone letter appended to the region
pub const DEFAULT_ZONE_SUFFIX: &str = "b";

/// Fixed defaults for everything the caller does not supply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClusterDefaults {
    pub machine_type: String,
    pub boot_disk_size_gb: u32,
    pub num_local_ssds: u32,
    pub master_instance_name: String,
    pub zone_suffix: String,
    pub subnetwork: String,
    pub config_bucket: String,
}

impl Default for ClusterDefaults {
    fn default() -> Self {
        Self {
            machine_type: DEFAULT_MACHINE_TYPE.to_string(),
            boot_disk_size_gb: DEFAULT_BOOT_DISK_SIZE_GB,
            num_local_ssds: 0,
            master_instance_name: DEFAULT_MASTER_INSTANCE_NAME.to_string(),
            zone_suffix: DEFAULT_ZONE_SUFFIX.to_string(),
            subnetwork: "default".to_string(),
            config_bucket: String::new(),
        }
    }
}

impl ClusterDefaults {
    /// Zone URI for a region, e.g. `us-east1-b`
    pub fn zone_for(&self, region: &str) -> String {
        format!("{}-{}", region, self.zone_suffix)
    }

    fn instance_group(&self, instance_names: Vec<String>, count: u32) -> InstanceGroupConfig {
        InstanceGroupConfig {
            num_instances: count,
            instance_names,
            machine_type_uri: self.machine_type.clone(),
            disk_config: DiskConfig {
                boot_disk_size_gb: self.boot_disk_size_gb,
                num_local_ssds: self.num_local_ssds,
            },
        }
    }
}

// ============================================================================
// Wire types (camelCase, matching the REST resource)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDescriptor {
    pub project_id: String,
    pub cluster_name: String,
    pub config: ClusterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub config_bucket: String,
    pub gce_cluster_config: GceClusterConfig,
    pub master_config: InstanceGroupConfig,
    pub worker_config: InstanceGroupConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceClusterConfig {
    pub subnetwork_uri: String,
    pub zone_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupConfig {
    pub num_instances: u32,
    pub instance_names: Vec<String>,
    pub machine_type_uri: String,
    pub disk_config: DiskConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskConfig {
    pub boot_disk_size_gb: u32,
    pub num_local_ssds: u32,
}

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Build the create request body.
///
/// Worker names are passed through as given; a length mismatch with
/// `worker_count` is left for the provider to reject.
pub fn build_create_request(
    project: &str,
    region: &str,
    defaults: &ClusterDefaults,
    name: &str,
    worker_count: u32,
    worker_names: &[String],
) -> ClusterDescriptor {
    ClusterDescriptor {
        project_id: project.to_string(),
        cluster_name: name.to_string(),
        config: ClusterConfig {
            config_bucket: defaults.config_bucket.clone(),
            gce_cluster_config: GceClusterConfig {
                subnetwork_uri: defaults.subnetwork.clone(),
                zone_uri: defaults.zone_for(region),
            },
            master_config: defaults
                .instance_group(vec![defaults.master_instance_name.clone()], 1),
            worker_config: defaults.instance_group(worker_names.to_vec(), worker_count),
        },
    }
}

/// Errors for malformed create parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid cluster name '{0}': must start with a lowercase letter, contain only lowercase letters, digits and hyphens, end with a letter or digit, and be at most 51 characters")]
    InvalidName(String),

    #[error("Worker count is {count} but {names} worker names were given")]
    WorkerCountMismatch { count: u32, names: usize },
}

fn cluster_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z](?:[-a-z0-9]{0,49}[a-z0-9])?$").expect("cluster name pattern is valid")
    })
}

/// Check create parameters before anything is sent
pub fn validate_create_request(
    name: &str,
    worker_count: u32,
    worker_names: &[String],
) -> Result<(), ValidationError> {
    if !cluster_name_pattern().is_match(name) {
        return Err(ValidationError::InvalidName(name.to_string()));
    }
    if worker_names.len() != worker_count as usize {
        return Err(ValidationError::WorkerCountMismatch {
            count: worker_count,
            names: worker_names.len(),
        });
    }
    Ok(())
}
