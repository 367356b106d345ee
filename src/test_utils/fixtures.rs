//! Sample service definitions.

use std::path::{Path, PathBuf};

use super::write_service;

/// A named service definition used across tests.
#[derive(Clone, Debug)]
pub struct ServiceFixture {
    pub content: String,
    pub name: String,
}

impl ServiceFixture {
    /// A table, a queue and a topic under the default naming prefix.
    pub fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            content: r"
service: svc
provider:
  name: aws
  environment:
    LOG_LEVEL: info
resources:
  Resources:
    UserTable:
      Type: AWS::DynamoDB::Table
    JobsQueue:
      Type: AWS::SQS::Queue
    OrderTopic:
      Type: AWS::SNS::Topic
"
            .trim()
            .to_string(),
        }
    }

    /// FIFO queue with a custom prefix and stage.
    pub fn fifo_queue() -> Self {
        Self {
            name: "fifo_queue".to_string(),
            content: r"
service: orders
provider:
  name: aws
  stage: prod
custom:
  resourceNames:
    prefix: app
resources:
  Resources:
    MyQueueTwo:
      Type: AWS::SQS::Queue
      Properties:
        FifoQueue: true
"
            .trim()
            .to_string(),
        }
    }

    /// Functions that reference computed names through variables.
    pub fn with_references() -> Self {
        Self {
            name: "with_references".to_string(),
            content: r"
service: svc
provider:
  name: aws
  environment:
    ORDERS_TOPIC_NAME: ${topic:OrderTopic.topicName}
functions:
  worker:
    handler: worker.handler
    environment:
      TABLE: ${name:UserTable}
resources:
  Resources:
    UserTable:
      Type: AWS::DynamoDB::Table
    OrderTopic:
      Type: AWS::SNS::Topic
"
            .trim()
            .to_string(),
        }
    }

    /// A resource type without a built-in strategy.
    pub fn unknown_type() -> Self {
        Self {
            name: "unknown_type".to_string(),
            content: r"
service: svc
resources:
  Resources:
    Thing:
      Type: AWS::Foo::Bar
"
            .trim()
            .to_string(),
        }
    }

    /// Write this fixture as `serverless.yml` into `dir`.
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        write_service(dir, &self.content)
    }
}
