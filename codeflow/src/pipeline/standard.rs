//! The standard classify-input, route-intent, solve pipeline.

use super::{Pipeline, PipelineBuilder};
use crate::config::CodeflowConfig;
use crate::errors::CodeflowError;
use crate::stages::{
    ClassifyInputStage, KeywordClassifier, RouteIntentStage, SolveStage, StagePorts,
};
use crate::tools::ToolCatalog;
use std::sync::Arc;

/// Name of the standard pipeline.
pub const STANDARD_PIPELINE: &str = "codeflow";

/// Stage names of the standard pipeline, in execution order.
pub const STANDARD_STAGES: [&str; 3] = [
    ClassifyInputStage::NAME,
    RouteIntentStage::NAME,
    SolveStage::NAME,
];

impl Pipeline {
    /// Builds the standard pipeline over `ports`.
    ///
    /// # Errors
    ///
    /// Returns an error if the classifier keywords fail to compile.
    pub fn standard(ports: StagePorts, config: &CodeflowConfig) -> Result<Self, CodeflowError> {
        let classifier = KeywordClassifier::new(&config.classifier)?;
        let catalog = ToolCatalog::new(Arc::clone(&ports.code_model));

        let pipeline = PipelineBuilder::new(STANDARD_PIPELINE)
            .instrumentation(&config.instrumentation)
            .stage(Arc::new(ClassifyInputStage::new(ports.vision_model, ports.images)))?
            .stage(Arc::new(RouteIntentStage::new(Arc::new(classifier))))?
            .stage(Arc::new(SolveStage::new(ports.code_model, ports.session, catalog)))?
            .build()?;
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[test]
    fn test_standard_stage_order() {
        let pipeline = TestHarness::new().pipeline().unwrap();

        assert_eq!(pipeline.name(), STANDARD_PIPELINE);
        assert_eq!(pipeline.stage_names(), STANDARD_STAGES.to_vec());
    }
}
