use std::str::FromStr;
use std::string::String;
use std::{env, fmt};

pub const DEFAULT_PARAMETER_NAME: &str = "/ec2-imagebuilder/latest";
pub const DEFAULT_PARAMETER_DESCRIPTION: &str = "Latest AMI ID";
pub const DEFAULT_PARAMETER_DATA_TYPE: &str = "text";
pub const DEFAULT_PIPELINE_ARN_PROPERTY: &str = "PIIPELINE_ARN";
pub const DEFAULT_PHYSICAL_RESOURCE_ID: &str = "img-builder-trigger-cr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SSM parameter receiving the latest AMI id.
    pub parameter_name: String,
    pub parameter_description: String,
    pub parameter_tier: ParameterTier,
    // "text" or "aws:ec2:image"
    pub parameter_data_type: String,
    pub tag_parameter: bool,
    /// Write each AMI id into the parameter of the AMI's own region rather than
    /// the region the function runs in.
    pub regional_writes: bool,
    pub pipeline_arn_property: String,
    pub physical_resource_id: String,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ParameterTier {
    Standard,
    Advanced,
    IntelligentTiering,
}

impl FromStr for ParameterTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "Standard" => Ok(ParameterTier::Standard),
            "Advanced" => Ok(ParameterTier::Advanced),
            "Intelligent-Tiering" => Ok(ParameterTier::IntelligentTiering),
            other => Err(format!("Invalid or Unsupported parameter tier {}", other)),
        }
    }
}

impl fmt::Display for ParameterTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParameterTier::Standard => write!(f, "Standard"),
            ParameterTier::Advanced => write!(f, "Advanced"),
            ParameterTier::IntelligentTiering => write!(f, "Intelligent-Tiering"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            parameter_name: DEFAULT_PARAMETER_NAME.to_string(),
            parameter_description: DEFAULT_PARAMETER_DESCRIPTION.to_string(),
            parameter_tier: ParameterTier::Standard,
            parameter_data_type: DEFAULT_PARAMETER_DATA_TYPE.to_string(),
            tag_parameter: true,
            regional_writes: true,
            pipeline_arn_property: DEFAULT_PIPELINE_ARN_PROPERTY.to_string(),
            physical_resource_id: DEFAULT_PHYSICAL_RESOURCE_ID.to_string(),
        }
    }
}

impl Config {
    pub fn load_from_env() -> Result<Config, String> {
        let conf = Config {
            parameter_name: non_empty_var("IMAGE_SSM_NAME", DEFAULT_PARAMETER_NAME)?,
            parameter_description: env::var("PARAMETER_DESCRIPTION")
                .unwrap_or(DEFAULT_PARAMETER_DESCRIPTION.to_string()),
            parameter_tier: env::var("PARAMETER_TIER")
                .unwrap_or("Standard".to_string())
                .parse::<ParameterTier>()?,
            parameter_data_type: match env::var("PARAMETER_DATA_TYPE") {
                Ok(v) if v == "text" || v == "aws:ec2:image" => v,
                Ok(v) => {
                    return Err(format!(
                        "Invalid PARAMETER_DATA_TYPE {} - expected text or aws:ec2:image",
                        v
                    ))
                }
                Err(_) => DEFAULT_PARAMETER_DATA_TYPE.to_string(),
            },
            tag_parameter: env::var("TAG_PARAMETER")
                .unwrap_or("true".to_string())
                .parse::<bool>()
                .map_err(|e| format!("Error parsing TAG_PARAMETER to bool - {}", e))?,
            regional_writes: env::var("REGIONAL_WRITES")
                .unwrap_or("true".to_string())
                .parse::<bool>()
                .map_err(|e| format!("Error parsing REGIONAL_WRITES to bool - {}", e))?,
            pipeline_arn_property: non_empty_var(
                "PIPELINE_ARN_PROPERTY",
                DEFAULT_PIPELINE_ARN_PROPERTY,
            )?,
            physical_resource_id: non_empty_var(
                "PHYSICAL_RESOURCE_ID",
                DEFAULT_PHYSICAL_RESOURCE_ID,
            )?,
        };

        Ok(conf)
    }
}

fn non_empty_var(key: &str, default: &str) -> Result<String, String> {
    match env::var(key) {
        Ok(v) if v.trim().is_empty() => Err(format!("{} is set but empty", key)),
        Ok(v) => Ok(v),
        Err(_) => Ok(default.to_string()),
    }
}
