//! Read pass: text to baseline and working model.

use super::ProjectConfig;
use crate::core::grammar::Document;
use crate::core::groups::{GroupList, GroupResolver};
use crate::core::model::{Model, ReadContext, ReadOptions, SECTION_ORDER};
use crate::core::validation::{Diagnostics, PROJECT_CONFIG};

pub(super) fn read(
    config_text: Option<&str>,
    groups_text: Option<&str>,
    options: ReadOptions,
) -> ProjectConfig {
    let mut diagnostics = Diagnostics::new();

    let (groups, group_errors) = GroupList::parse(groups_text.unwrap_or_default());
    diagnostics.extend(group_errors);

    let (document, syntax_errors) = Document::parse(config_text.unwrap_or_default());
    let document = document.with_section_order(SECTION_ORDER);
    diagnostics.extend(
        syntax_errors
            .into_iter()
            .map(|e| e.into_validation(PROJECT_CONFIG)),
    );

    let (model, diagnostics) = {
        let mut ctx = ReadContext {
            resolver: GroupResolver::new(&groups),
            diagnostics,
            options,
        };
        let model = Model::read(&document, &mut ctx);
        (model, ctx.diagnostics)
    };

    ProjectConfig {
        document,
        groups,
        groups_text: groups_text.map(String::from),
        baseline: model.clone(),
        working: model,
        errors: diagnostics.into_vec(),
    }
}
