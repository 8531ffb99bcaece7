//! Pipeline component stage

use crate::context::Diagnostics;
use crate::graph::{child_key, NewResource, ResourceType};
use crate::model::{MigrationModel, PipelineComponent, SourceRef, StageCategory};

use super::{append_item, application_group, key_of, ParserStage, StageId};

/// Creates a `PipelineComponent` item under the pipeline item for every
/// component of every stage, in document order
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineComponentParser;

impl ParserStage for PipelineComponentParser {
    fn id(&self) -> StageId {
        StageId::PipelineComponent
    }

    fn parse(&self, model: &mut MigrationModel) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let Some((group, graph)) = application_group(model) else {
            return diagnostics;
        };

        for (index, parsed) in group.applications.iter_mut().enumerate() {
            for (pipeline_index, pipeline) in parsed.application.pipelines.iter_mut().enumerate() {
                let (Some(document), Some(parent)) = (pipeline.document.as_mut(), pipeline.resource) else {
                    continue;
                };
                let parent_key = key_of(graph, parent);

                for (stage_index, stage) in document.stages.iter_mut().enumerate() {
                    let category = stage.category();
                    for (component_index, component) in stage.components.iter_mut().enumerate() {
                        let item = describe(&parent_key, category, (stage_index, component_index), component).with_source(
                            SourceRef::PipelineComponent {
                                application: index,
                                pipeline: pipeline_index,
                                stage: stage_index,
                                component: component_index,
                            },
                        );
                        component.resource = append_item(graph, parent, item, &mut diagnostics);
                    }
                }
            }
        }

        diagnostics
    }
}

/// Prefix of component properties, keeping them apart from the item's own properties
const PROPERTY_PREFIX: &str = "Property.";

fn describe(
    parent_key: &str,
    category: StageCategory,
    (stage_index, component_index): (usize, usize),
    component: &PipelineComponent,
) -> NewResource {
    // Two stages may share a category (e.g. both unknown)
    let key = child_key(parent_key, &format!("{}.{}.{}", category, stage_index, component_index));
    let name = component
        .component_name
        .clone()
        .unwrap_or_else(|| component.name.clone());

    let mut item = NewResource::item(key, name, ResourceType::PipelineComponent)
        .with_property("Stage", category.to_string())
        .with_property("TypeName", component.name.clone());
    if let Some(description) = &component.description {
        item = item.with_description(description.clone());
    }
    if let Some(version) = &component.version {
        item = item.with_property("Version", version.clone());
    }
    for property in &component.properties {
        if let Some(value) = &property.value {
            item = item.with_property(format!("{}{}", PROPERTY_PREFIX, property.name), value.clone());
        }
    }
    item
}
