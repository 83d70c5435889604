//! core::model::label
//!
//! Label definitions: `[label "<name>"]`.
//!
//! A label declares a set of scores (`value = -1 Needs work`), the score new
//! votes start at (`defaultValue`), how votes combine (`function`) and which
//! votes survive a new patch set (`copy*`).

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{
    flag_entry, format_score, read_flag, ConfigSection, Entries, ReadContext, UnparsedValues, LABEL,
};
use crate::core::grammar::Document;

const KEY_FUNCTION: &str = "function";
const KEY_DEFAULT_VALUE: &str = "defaultValue";
const KEY_VALUE: &str = "value";
const KEY_COPY_MIN_SCORE: &str = "copyMinScore";
const KEY_COPY_MAX_SCORE: &str = "copyMaxScore";
const KEY_COPY_ALL_SCORES_ON_MERGE_FIRST_PARENT_UPDATE: &str =
    "copyAllScoresOnMergeFirstParentUpdate";
const KEY_COPY_ALL_SCORES_ON_TRIVIAL_REBASE: &str = "copyAllScoresOnTrivialRebase";
const KEY_COPY_ALL_SCORES_IF_NO_CODE_CHANGE: &str = "copyAllScoresIfNoCodeChange";
const KEY_COPY_ALL_SCORES_IF_NO_CHANGE: &str = "copyAllScoresIfNoChange";
const KEY_COPY_VALUE: &str = "copyValue";
const KEY_CAN_OVERRIDE: &str = "canOverride";
const KEY_ALLOW_POST_SUBMIT: &str = "allowPostSubmit";
const KEY_IGNORE_SELF_APPROVAL: &str = "ignoreSelfApproval";
const KEY_BRANCH: &str = "branch";

pub const DEF_COPY_MIN_SCORE: bool = false;
pub const DEF_COPY_MAX_SCORE: bool = false;
pub const DEF_COPY_ALL_SCORES_ON_MERGE_FIRST_PARENT_UPDATE: bool = false;
pub const DEF_COPY_ALL_SCORES_ON_TRIVIAL_REBASE: bool = false;
pub const DEF_COPY_ALL_SCORES_IF_NO_CODE_CHANGE: bool = false;
pub const DEF_COPY_ALL_SCORES_IF_NO_CHANGE: bool = true;
pub const DEF_CAN_OVERRIDE: bool = true;
pub const DEF_ALLOW_POST_SUBMIT: bool = true;
pub const DEF_IGNORE_SELF_APPROVAL: bool = false;

/// How votes on a label combine into a submit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LabelFunction {
    #[default]
    MaxWithBlock,
    AnyWithBlock,
    MaxNoBlock,
    NoBlock,
    NoOp,
    PatchSetLock,
}

impl LabelFunction {
    pub const ALL: [LabelFunction; 6] = [
        LabelFunction::MaxWithBlock,
        LabelFunction::AnyWithBlock,
        LabelFunction::MaxNoBlock,
        LabelFunction::NoBlock,
        LabelFunction::NoOp,
        LabelFunction::PatchSetLock,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LabelFunction::MaxWithBlock => "MaxWithBlock",
            LabelFunction::AnyWithBlock => "AnyWithBlock",
            LabelFunction::MaxNoBlock => "MaxNoBlock",
            LabelFunction::NoBlock => "NoBlock",
            LabelFunction::NoOp => "NoOp",
            LabelFunction::PatchSetLock => "PatchSetLock",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for LabelFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One declared score with its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelValue {
    score: i16,
    text: String,
}

impl LabelValue {
    pub fn new(score: i16, text: impl Into<String>) -> Self {
        Self {
            score,
            text: text.into(),
        }
    }

    pub fn score(&self) -> i16 {
        self.score
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse `<score> <text>`; a `+` sign and a sign separated from its
    /// digits are accepted.
    ///
    /// # Errors
    ///
    /// Returns a reason when the text is empty or the score is not a number.
    ///
    /// ```
    /// use projcfg::core::model::LabelValue;
    ///
    /// assert_eq!(LabelValue::parse("+1 Looks good").unwrap(), LabelValue::new(1, "Looks good"));
    /// assert_eq!(LabelValue::parse("- 2 Do not submit").unwrap().score(), -2);
    /// assert!(LabelValue::parse("x Nope").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err("empty value".into());
        }
        let (mut score_text, mut rest) = split_word(trimmed);
        let joined;
        if score_text == "+" || score_text == "-" {
            let (digits, tail) = split_word(rest);
            joined = format!("{score_text}{digits}");
            score_text = &joined;
            rest = tail;
        }
        let score = parse_score(score_text).ok_or_else(|| format!("invalid score \"{score_text}\""))?;
        Ok(Self::new(score, rest))
    }

    /// `+1 Looks good`, `0 No score`, `-1 Needs work`.
    pub fn format(&self) -> String {
        if self.text.is_empty() {
            format_score(self.score)
        } else {
            format!("{} {}", format_score(self.score), self.text)
        }
    }
}

fn split_word(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim_start()),
        None => (text, ""),
    }
}

fn parse_score(text: &str) -> Option<i16> {
    let unsigned = text.strip_prefix('+').unwrap_or(text);
    if unsigned.starts_with('+') {
        return None;
    }
    unsigned.parse().ok()
}

/// Check a label name.
///
/// # Errors
///
/// Returns a reason for empty names, a leading `-`, or characters other than
/// ASCII letters, digits and `-`.
pub fn check_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("empty label name".into());
    }
    if name.starts_with('-') {
        return Err("label name cannot start with '-'".into());
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
        return Err(format!("illegal character '{c}'"));
    }
    Ok(())
}

/// A label definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelType {
    name: String,
    function: LabelFunction,
    default_value: i16,
    values: Vec<LabelValue>,
    #[serde(skip)]
    unparsed_values: UnparsedValues,
    copy_min_score: bool,
    copy_max_score: bool,
    copy_all_scores_on_merge_first_parent_update: bool,
    copy_all_scores_on_trivial_rebase: bool,
    copy_all_scores_if_no_code_change: bool,
    copy_all_scores_if_no_change: bool,
    copy_values: Vec<i16>,
    can_override: bool,
    allow_post_submit: bool,
    ignore_self_approval: bool,
    branches: Vec<String>,
}

impl LabelType {
    /// A new label with the given values and default settings.
    ///
    /// Values are ordered by score; for duplicate scores the later one wins.
    pub fn new(name: impl Into<String>, values: Vec<LabelValue>) -> Self {
        let mut label = Self {
            name: name.into(),
            function: LabelFunction::default(),
            default_value: 0,
            values: Vec::new(),
            unparsed_values: UnparsedValues::default(),
            copy_min_score: DEF_COPY_MIN_SCORE,
            copy_max_score: DEF_COPY_MAX_SCORE,
            copy_all_scores_on_merge_first_parent_update:
                DEF_COPY_ALL_SCORES_ON_MERGE_FIRST_PARENT_UPDATE,
            copy_all_scores_on_trivial_rebase: DEF_COPY_ALL_SCORES_ON_TRIVIAL_REBASE,
            copy_all_scores_if_no_code_change: DEF_COPY_ALL_SCORES_IF_NO_CODE_CHANGE,
            copy_all_scores_if_no_change: DEF_COPY_ALL_SCORES_IF_NO_CHANGE,
            copy_values: Vec::new(),
            can_override: DEF_CAN_OVERRIDE,
            allow_post_submit: DEF_ALLOW_POST_SUBMIT,
            ignore_self_approval: DEF_IGNORE_SELF_APPROVAL,
            branches: Vec::new(),
        };
        label.set_values(values);
        label
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self) -> LabelFunction {
        self.function
    }

    pub fn set_function(&mut self, function: LabelFunction) {
        self.function = function;
    }

    pub fn default_value(&self) -> i16 {
        self.default_value
    }

    pub fn set_default_value(&mut self, score: i16) {
        self.default_value = score;
    }

    /// Declared values in ascending score order.
    pub fn values(&self) -> &[LabelValue] {
        &self.values
    }

    /// Replace the values, dropping `value` lines that failed to parse.
    pub fn set_values(&mut self, values: Vec<LabelValue>) {
        let by_score: BTreeMap<i16, LabelValue> =
            values.into_iter().map(|v| (v.score, v)).collect();
        self.values = by_score.into_values().collect();
        self.unparsed_values.clear();
    }

    /// Add or replace the value with the same score.
    pub fn put_value(&mut self, value: LabelValue) {
        match self.values.binary_search_by_key(&value.score, |v| v.score) {
            Ok(idx) => self.values[idx] = value,
            Err(idx) => self.values.insert(idx, value),
        }
    }

    /// `value` lines that did not parse; written back until the values are
    /// replaced with [`LabelType::set_values`].
    pub fn unparsed_values(&self) -> &UnparsedValues {
        &self.unparsed_values
    }

    pub fn value(&self, score: i16) -> Option<&LabelValue> {
        self.values.iter().find(|v| v.score == score)
    }

    pub fn min(&self) -> Option<&LabelValue> {
        self.values.first()
    }

    pub fn max(&self) -> Option<&LabelValue> {
        self.values.last()
    }

    pub fn is_copy_min_score(&self) -> bool {
        self.copy_min_score
    }

    pub fn set_copy_min_score(&mut self, copy: bool) {
        self.copy_min_score = copy;
    }

    pub fn is_copy_max_score(&self) -> bool {
        self.copy_max_score
    }

    pub fn set_copy_max_score(&mut self, copy: bool) {
        self.copy_max_score = copy;
    }

    pub fn is_copy_all_scores_on_merge_first_parent_update(&self) -> bool {
        self.copy_all_scores_on_merge_first_parent_update
    }

    pub fn set_copy_all_scores_on_merge_first_parent_update(&mut self, copy: bool) {
        self.copy_all_scores_on_merge_first_parent_update = copy;
    }

    pub fn is_copy_all_scores_on_trivial_rebase(&self) -> bool {
        self.copy_all_scores_on_trivial_rebase
    }

    pub fn set_copy_all_scores_on_trivial_rebase(&mut self, copy: bool) {
        self.copy_all_scores_on_trivial_rebase = copy;
    }

    pub fn is_copy_all_scores_if_no_code_change(&self) -> bool {
        self.copy_all_scores_if_no_code_change
    }

    pub fn set_copy_all_scores_if_no_code_change(&mut self, copy: bool) {
        self.copy_all_scores_if_no_code_change = copy;
    }

    pub fn is_copy_all_scores_if_no_change(&self) -> bool {
        self.copy_all_scores_if_no_change
    }

    pub fn set_copy_all_scores_if_no_change(&mut self, copy: bool) {
        self.copy_all_scores_if_no_change = copy;
    }

    /// Specific scores copied forward to new patch sets.
    pub fn copy_values(&self) -> &[i16] {
        &self.copy_values
    }

    pub fn set_copy_values(&mut self, mut scores: Vec<i16>) {
        scores.sort_unstable();
        scores.dedup();
        self.copy_values = scores;
    }

    pub fn can_override(&self) -> bool {
        self.can_override
    }

    pub fn set_can_override(&mut self, can_override: bool) {
        self.can_override = can_override;
    }

    pub fn allow_post_submit(&self) -> bool {
        self.allow_post_submit
    }

    pub fn set_allow_post_submit(&mut self, allow: bool) {
        self.allow_post_submit = allow;
    }

    pub fn ignore_self_approval(&self) -> bool {
        self.ignore_self_approval
    }

    pub fn set_ignore_self_approval(&mut self, ignore: bool) {
        self.ignore_self_approval = ignore;
    }

    /// Ref patterns the label is restricted to; empty means all branches.
    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn set_branches(&mut self, branches: Vec<String>) {
        self.branches = branches;
    }
}

impl ConfigSection for LabelType {
    fn section(&self) -> &'static str {
        LABEL
    }

    fn subsection(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn entries(&self) -> Entries {
        vec![
            (KEY_FUNCTION.to_string(), vec![self.function.name().to_string()]),
            (KEY_DEFAULT_VALUE.to_string(), vec![self.default_value.to_string()]),
            flag_entry(KEY_COPY_MIN_SCORE, self.copy_min_score, DEF_COPY_MIN_SCORE),
            flag_entry(KEY_COPY_MAX_SCORE, self.copy_max_score, DEF_COPY_MAX_SCORE),
            flag_entry(
                KEY_COPY_ALL_SCORES_ON_MERGE_FIRST_PARENT_UPDATE,
                self.copy_all_scores_on_merge_first_parent_update,
                DEF_COPY_ALL_SCORES_ON_MERGE_FIRST_PARENT_UPDATE,
            ),
            flag_entry(
                KEY_COPY_ALL_SCORES_ON_TRIVIAL_REBASE,
                self.copy_all_scores_on_trivial_rebase,
                DEF_COPY_ALL_SCORES_ON_TRIVIAL_REBASE,
            ),
            flag_entry(
                KEY_COPY_ALL_SCORES_IF_NO_CODE_CHANGE,
                self.copy_all_scores_if_no_code_change,
                DEF_COPY_ALL_SCORES_IF_NO_CODE_CHANGE,
            ),
            flag_entry(
                KEY_COPY_ALL_SCORES_IF_NO_CHANGE,
                self.copy_all_scores_if_no_change,
                DEF_COPY_ALL_SCORES_IF_NO_CHANGE,
            ),
            (
                KEY_COPY_VALUE.to_string(),
                self.copy_values.iter().map(|&s| format_score(s)).collect(),
            ),
            flag_entry(KEY_CAN_OVERRIDE, self.can_override, DEF_CAN_OVERRIDE),
            flag_entry(KEY_ALLOW_POST_SUBMIT, self.allow_post_submit, DEF_ALLOW_POST_SUBMIT),
            flag_entry(
                KEY_IGNORE_SELF_APPROVAL,
                self.ignore_self_approval,
                DEF_IGNORE_SELF_APPROVAL,
            ),
            (KEY_BRANCH.to_string(), self.branches.clone()),
            (
                KEY_VALUE.to_string(),
                self.unparsed_values
                    .merge_into(self.values.iter().map(LabelValue::format).collect()),
            ),
        ]
    }
}

pub(crate) fn read_all(doc: &Document, ctx: &mut ReadContext<'_>) -> Vec<LabelType> {
    let mut labels: Vec<LabelType> = Vec::new();
    for name in doc.subsections(LABEL) {
        if let Err(reason) = check_name(&name) {
            ctx.diagnostics
                .error(format!("Invalid label name \"{name}\": {reason}"));
            continue;
        }
        if let Some(prior) = labels
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(&name))
        {
            ctx.diagnostics
                .error(format!("Label \"{name}\" conflicts with \"{}\"", prior.name));
            continue;
        }
        let label = read_one(doc, name, ctx);
        labels.push(label);
    }
    labels
}

fn read_one(doc: &Document, name: String, ctx: &mut ReadContext<'_>) -> LabelType {
    let sub = Some(name.as_str());

    let mut values = Vec::new();
    let mut unparsed = UnparsedValues::default();
    for (position, raw) in doc.get_list(LABEL, sub, KEY_VALUE).into_iter().enumerate() {
        match LabelValue::parse(&raw) {
            Ok(value) => values.push(value),
            Err(_) => {
                ctx.diagnostics
                    .error(format!("Invalid value \"{raw}\" for label \"{name}\""));
                unparsed.push(position, raw);
            }
        }
    }
    let mut label = LabelType::new(name.clone(), values);
    label.unparsed_values = unparsed;

    if let Some(raw) = doc.get(LABEL, sub, KEY_FUNCTION) {
        match LabelFunction::parse(raw.trim()) {
            Some(function) => label.function = function,
            None => {
                let names: Vec<&str> = LabelFunction::ALL.iter().map(|f| f.name()).collect();
                ctx.diagnostics.error(format!(
                    "Invalid function for label \"{name}\". Valid names are: {}",
                    names.join(", ")
                ));
            }
        }
    }

    let raw_default = doc.get(LABEL, sub, KEY_DEFAULT_VALUE);
    let declared = raw_default
        .as_deref()
        .map(|raw| parse_score(raw.trim()))
        .unwrap_or(Some(0));
    match declared {
        Some(score) if label.values.is_empty() || label.value(score).is_some() => {
            label.default_value = score;
        }
        _ => {
            let raw = raw_default.unwrap_or_else(|| "0".to_string());
            ctx.diagnostics
                .error(format!("Invalid defaultValue \"{raw}\" for label \"{name}\""));
        }
    }

    let flag = |key: &str, default: bool, ctx: &mut ReadContext<'_>| {
        read_flag(doc, LABEL, sub, key, default, ctx)
    };
    label.copy_min_score = flag(KEY_COPY_MIN_SCORE, DEF_COPY_MIN_SCORE, ctx);
    label.copy_max_score = flag(KEY_COPY_MAX_SCORE, DEF_COPY_MAX_SCORE, ctx);
    label.copy_all_scores_on_merge_first_parent_update = flag(
        KEY_COPY_ALL_SCORES_ON_MERGE_FIRST_PARENT_UPDATE,
        DEF_COPY_ALL_SCORES_ON_MERGE_FIRST_PARENT_UPDATE,
        ctx,
    );
    label.copy_all_scores_on_trivial_rebase = flag(
        KEY_COPY_ALL_SCORES_ON_TRIVIAL_REBASE,
        DEF_COPY_ALL_SCORES_ON_TRIVIAL_REBASE,
        ctx,
    );
    label.copy_all_scores_if_no_code_change = flag(
        KEY_COPY_ALL_SCORES_IF_NO_CODE_CHANGE,
        DEF_COPY_ALL_SCORES_IF_NO_CODE_CHANGE,
        ctx,
    );
    label.copy_all_scores_if_no_change = flag(
        KEY_COPY_ALL_SCORES_IF_NO_CHANGE,
        DEF_COPY_ALL_SCORES_IF_NO_CHANGE,
        ctx,
    );
    label.can_override = flag(KEY_CAN_OVERRIDE, DEF_CAN_OVERRIDE, ctx);
    label.allow_post_submit = flag(KEY_ALLOW_POST_SUBMIT, DEF_ALLOW_POST_SUBMIT, ctx);
    label.ignore_self_approval = flag(KEY_IGNORE_SELF_APPROVAL, DEF_IGNORE_SELF_APPROVAL, ctx);

    let mut copy_values = Vec::new();
    for raw in doc.get_list(LABEL, sub, KEY_COPY_VALUE) {
        match parse_score(raw.trim()) {
            Some(score) => copy_values.push(score),
            None => ctx
                .diagnostics
                .error(format!("Invalid copyValue \"{raw}\" for label \"{name}\"")),
        }
    }
    label.set_copy_values(copy_values);

    label.branches = doc.get_list(LABEL, sub, KEY_BRANCH);
    label
}
