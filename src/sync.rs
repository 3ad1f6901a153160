use aws_lambda_events::event::sns::SnsEvent;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::notification::{BuildMessage, ImageArtifact};
use crate::ssm::{ParameterEntry, ParameterStore, ParameterTag};

pub const SOURCE_TAG_VALUE: &str = "EC2 Image Builder";

/// Summary of one synchronizer invocation. Nothing consumes it beyond the logs.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub status_code: u16,
    pub records: usize,
    pub skipped: usize,
    pub malformed: usize,
    pub parameters_written: usize,
    pub failures: usize,
    /// Parameters that were written but could not be tagged. Also counted in
    /// `parameters_written`.
    pub tag_failures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmiOutcome {
    Written,
    WrittenUntagged,
    Failed,
}

/// Writes the AMI ids of every successful build in `event` into the configured
/// parameter. Each record and each artifact is attempted independently; failures
/// are logged and counted, never returned.
pub async fn handle(store: &dyn ParameterStore, config: &Config, event: SnsEvent) -> SyncReport {
    let mut report = SyncReport {
        status_code: 200,
        records: event.records.len(),
        ..SyncReport::default()
    };
    info!(records = report.records, "image builder notification received");

    for (index, record) in event.records.iter().enumerate() {
        debug!(index, message_id = %record.sns.message_id, "processing record");
        let message = match record.sns.message.parse::<BuildMessage>() {
            Ok(message) => message,
            Err(e) => {
                error!(index, message_id = %record.sns.message_id, error = %e, "skipping record");
                report.malformed += 1;
                continue;
            }
        };

        if !message.is_available() {
            info!(
                index,
                recipe = %message.name,
                status = ?message.state.status,
                reason = message.state.reason.as_deref(),
                "image is not available, nothing to record"
            );
            report.skipped += 1;
            continue;
        }

        info!(index, recipe = %message.name, image_arn = message.arn.as_deref(), "image is available");
        if message.output_resources.amis.is_empty() {
            warn!(index, recipe = %message.name, "available image has no output amis");
        }

        for ami in &message.output_resources.amis {
            match record_ami(store, config, &message, ami).await {
                AmiOutcome::Written => report.parameters_written += 1,
                AmiOutcome::WrittenUntagged => {
                    report.parameters_written += 1;
                    report.tag_failures += 1;
                }
                AmiOutcome::Failed => report.failures += 1,
            }
        }
    }

    info!(?report, "image builder notification processed");
    report
}

/// A tagging failure does not undo the write.
async fn record_ami(
    store: &dyn ParameterStore,
    config: &Config,
    message: &BuildMessage,
    ami: &ImageArtifact,
) -> AmiOutcome {
    let entry = parameter_entry(config, ami);
    info!(ami_id = %ami.image, region = %ami.region, parameter = %entry.name, "updating parameter");

    match store.put_parameter(&entry).await {
        Ok(version) => info!(parameter = %entry.name, version, ami_id = %ami.image, "parameter updated"),
        Err(e) => {
            error!(parameter = %entry.name, ami_id = %ami.image, error = %e, "failed to update parameter");
            return AmiOutcome::Failed;
        }
    }

    if config.tag_parameter {
        let tags = provenance_tags(message, ami);
        if let Err(e) = store
            .add_tags(entry.region.as_deref(), &entry.name, &tags)
            .await
        {
            error!(parameter = %entry.name, ami_id = %ami.image, error = %e, "failed to tag parameter");
            return AmiOutcome::WrittenUntagged;
        }
    }

    AmiOutcome::Written
}

pub fn parameter_entry(config: &Config, ami: &ImageArtifact) -> ParameterEntry {
    ParameterEntry {
        name: config.parameter_name.clone(),
        value: ami.image.clone(),
        description: config.parameter_description.clone(),
        data_type: config.parameter_data_type.clone(),
        tier: config.parameter_tier,
        region: config.regional_writes.then(|| ami.region.clone()),
    }
}

pub fn provenance_tags(message: &BuildMessage, ami: &ImageArtifact) -> Vec<ParameterTag> {
    let mut tags = vec![
        ParameterTag::new("Source", SOURCE_TAG_VALUE),
        ParameterTag::new("AMI_REGION", &ami.region),
        ParameterTag::new("AMI_ID", &ami.image),
        ParameterTag::new("AMI_NAME", &ami.name),
        ParameterTag::new("RECIPE_NAME", &message.name),
    ];
    if let Some(arn) = &message.source_pipeline_arn {
        tags.push(ParameterTag::new("SOURCE_PIPELINE_ARN", arn));
    }
    tags
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ParameterTier;
    use crate::error::HandlerError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeParameterStore {
        fail_puts_for: Vec<String>,
        fail_tags_for: Vec<String>,
        puts: Mutex<Vec<ParameterEntry>>,
        tags: Mutex<Vec<(Option<String>, String, Vec<ParameterTag>)>>,
    }

    #[async_trait]
    impl ParameterStore for FakeParameterStore {
        async fn put_parameter(&self, entry: &ParameterEntry) -> Result<i64, HandlerError> {
            if self.fail_puts_for.contains(&entry.value) {
                return Err(HandlerError::ExternalService("ThrottlingException".to_string()));
            }
            let mut puts = self.puts.lock().unwrap();
            puts.push(entry.clone());
            Ok(puts.len() as i64)
        }

        async fn add_tags(
            &self,
            region: Option<&str>,
            name: &str,
            tags: &[ParameterTag],
        ) -> Result<(), HandlerError> {
            let ami_id = tags.iter().find(|t| t.key == "AMI_ID").map(|t| &t.value);
            if ami_id.is_some_and(|id| self.fail_tags_for.contains(id)) {
                return Err(HandlerError::ExternalService("AccessDeniedException".to_string()));
            }
            self.tags.lock().unwrap().push((
                region.map(str::to_string),
                name.to_string(),
                tags.to_vec(),
            ));
            Ok(())
        }
    }

    fn ami(region: &str, image: &str) -> ImageArtifact {
        ImageArtifact {
            region: region.to_string(),
            image: image.to_string(),
            name: format!("golden-linux {}", image),
            description: None,
            account_id: None,
        }
    }

    fn sns_event(messages: &[&str]) -> SnsEvent {
        let records = messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                serde_json::json!({
                    "EventVersion": "1.0",
                    "EventSubscriptionArn": "arn:aws:sns:eu-west-1:123456789012:image-builder:sub",
                    "EventSource": "aws:sns",
                    "Sns": {
                        "Type": "Notification",
                        "MessageId": format!("message-{}", i),
                        "TopicArn": "arn:aws:sns:eu-west-1:123456789012:image-builder",
                        "Message": message,
                        "Timestamp": "1970-01-01T00:00:00.000Z",
                        "SignatureVersion": "1",
                        "Signature": "EXAMPLE",
                        "SigningCertUrl": "EXAMPLE",
                        "UnsubscribeUrl": "EXAMPLE",
                        "MessageAttributes": {}
                    }
                })
            })
            .collect::<Vec<_>>();
        serde_json::from_value(serde_json::json!({ "Records": records })).unwrap()
    }

    fn build_message(status: &str, amis: &[ImageArtifact]) -> String {
        let amis = amis
            .iter()
            .map(|a| serde_json::json!({ "region": a.region, "image": a.image, "name": a.name }))
            .collect::<Vec<_>>();
        serde_json::json!({
            "name": "golden-linux",
            "state": { "status": status },
            "sourcePipelineArn": "arn:aws:imagebuilder:eu-west-1:123456789012:image-pipeline/golden",
            "outputResources": { "amis": amis }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_every_ami_is_recorded() {
        let store = FakeParameterStore::default();
        let amis = [ami("eu-west-1", "ami-111"), ami("us-east-1", "ami-222")];
        let event = sns_event(&[&build_message("AVAILABLE", &amis)]);

        let report = handle(&store, &Config::default(), event).await;

        assert_eq!(report.parameters_written, 2);
        assert_eq!(report.failures, 0);
        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[0].value, "ami-111");
        assert_eq!(puts[0].region.as_deref(), Some("eu-west-1"));
        assert_eq!(puts[1].value, "ami-222");
        assert_eq!(puts[1].region.as_deref(), Some("us-east-1"));

        let tags = store.tags.lock().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].0.as_deref(), Some("us-east-1"));
        assert_eq!(tags[1].1, "/ec2-imagebuilder/latest");
        assert!(tags[1].2.contains(&ParameterTag::new("AMI_ID", "ami-222")));
        assert!(tags[1].2.contains(&ParameterTag::new("AMI_REGION", "us-east-1")));
    }

    #[tokio::test]
    async fn test_pending_build_is_skipped() {
        let store = FakeParameterStore::default();
        let event = sns_event(&[&build_message("PENDING", &[ami("eu-west-1", "ami-111")])]);

        let report = handle(&store, &Config::default(), event).await;

        assert_eq!(report.skipped, 1);
        assert!(store.puts.lock().unwrap().is_empty());
        assert!(store.tags.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_put_does_not_stop_next_ami() {
        let store = FakeParameterStore {
            fail_puts_for: vec!["ami-111".to_string()],
            ..FakeParameterStore::default()
        };
        let amis = [ami("eu-west-1", "ami-111"), ami("eu-west-1", "ami-222")];
        let event = sns_event(&[&build_message("AVAILABLE", &amis)]);

        let report = handle(&store, &Config::default(), event).await;

        assert_eq!(report.failures, 1);
        assert_eq!(report.parameters_written, 1);
        assert_eq!(report.tag_failures, 0);
        assert_eq!(store.puts.lock().unwrap()[0].value, "ami-222");
        // no provenance is attached for the write that failed
        let tags = store.tags.lock().unwrap();
        assert_eq!(tags.len(), 1);
        assert!(tags[0].2.contains(&ParameterTag::new("AMI_ID", "ami-222")));
    }

    #[tokio::test]
    async fn test_failed_tagging_does_not_stop_next_ami() {
        let store = FakeParameterStore {
            fail_tags_for: vec!["ami-111".to_string()],
            ..FakeParameterStore::default()
        };
        let amis = [ami("eu-west-1", "ami-111"), ami("us-east-1", "ami-222")];
        let event = sns_event(&[&build_message("AVAILABLE", &amis)]);

        let report = handle(&store, &Config::default(), event).await;

        assert_eq!(report.parameters_written, 2);
        assert_eq!(report.tag_failures, 1);
        assert_eq!(report.failures, 0);
        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[1].value, "ami-222");
        let tags = store.tags.lock().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].0.as_deref(), Some("us-east-1"));
        assert!(tags[0].2.contains(&ParameterTag::new("AMI_ID", "ami-222")));
    }

    #[tokio::test]
    async fn test_tagging_disabled() {
        let store = FakeParameterStore::default();
        let config = Config {
            tag_parameter: false,
            regional_writes: false,
            ..Config::default()
        };
        let event = sns_event(&[&build_message("AVAILABLE", &[ami("us-east-2", "ami-333")])]);

        handle(&store, &config, event).await;

        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].region, None);
        assert!(store.tags.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parameter_entry_from_config() {
        let config = Config {
            parameter_name: "/golden/latest".to_string(),
            parameter_tier: ParameterTier::Advanced,
            parameter_data_type: "aws:ec2:image".to_string(),
            ..Config::default()
        };
        let entry = parameter_entry(&config, &ami("ap-southeast-2", "ami-444"));
        assert_eq!(
            entry,
            ParameterEntry {
                name: "/golden/latest".to_string(),
                value: "ami-444".to_string(),
                description: "Latest AMI ID".to_string(),
                data_type: "aws:ec2:image".to_string(),
                tier: ParameterTier::Advanced,
                region: Some("ap-southeast-2".to_string()),
            }
        );
    }

    #[test]
    fn test_provenance_tags() {
        let message: BuildMessage = build_message("AVAILABLE", &[]).parse().unwrap();
        let tags = provenance_tags(&message, &ami("eu-west-1", "ami-111"));
        let keys = tags.iter().map(|t| t.key.as_str()).collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec!["Source", "AMI_REGION", "AMI_ID", "AMI_NAME", "RECIPE_NAME", "SOURCE_PIPELINE_ARN"]
        );
        assert_eq!(tags[0].value, "EC2 Image Builder");
        assert_eq!(tags[3].value, "golden-linux ami-111");
        assert_eq!(tags[4].value, "golden-linux");

        let mut message = message;
        message.source_pipeline_arn = None;
        assert_eq!(provenance_tags(&message, &ami("eu-west-1", "ami-111")).len(), 5);
    }
}
