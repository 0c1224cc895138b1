//! The pluggable validation framework.
//!
//! A [rule](ValidationRule) inspects one decoded element through its
//! [context](RuleContext) and reports at most one [issue](ValidationIssue)
//! per invocation, identified by a stable code string.
//! A [profile](ValidationProfile) bundles an ordered rule list with a
//! default [behavior](Behavior) and optional per-tag overrides.
//! The engine runs after each element is decoded:
//! issues are collected, offered to the registered callback
//! (which may veto the whole parse), and, when the effective behavior
//! is [`Behavior::Validate`], an error-severity issue aborts parsing.

use crate::mem::Dataset;
use chrono::NaiveDate;
use dcmkit_core::dictionary::VirtualVr;
use dcmkit_core::uid::validate_uid;
use dcmkit_core::{Tag, VR};
use dcmkit_encoding::text::{validate_cs, validate_dt, TextValidationOutcome};
use dcmkit_encoding::SpecificCharacterSet;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// A note with no conformance impact.
    Info,
    /// A conformance violation tolerated by lenient readers.
    Warning,
    /// A conformance violation.
    Error,
}

/// One finding of the validation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// A stable code identifying the kind of finding.
    pub code: Cow<'static, str>,
    /// The severity of the finding.
    pub severity: Severity,
    /// The tag of the offending element, if any.
    pub tag: Option<Tag>,
    /// The value representation the element declared.
    pub declared_vr: Option<VR>,
    /// The value representation the dictionary expects.
    pub expected_vr: Option<VR>,
    /// The stream position the finding refers to.
    pub position: u64,
    /// A human readable description.
    pub message: String,
    /// A suggestion on how the content could be repaired.
    pub suggested_fix: Option<String>,
    /// A copy of the offending value bytes,
    /// safe to keep past the source buffer.
    pub raw_bytes: Option<Vec<u8>>,
}

impl ValidationIssue {
    /// Create an issue from its code, severity and message.
    pub fn new(
        code: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            code: code.into(),
            severity,
            tag: None,
            declared_vr: None,
            expected_vr: None,
            position: 0,
            message: message.into(),
            suggested_fix: None,
            raw_bytes: None,
        }
    }

    /// Attach the offending element context.
    pub fn for_element(mut self, ctx: &RuleContext) -> Self {
        self.tag = Some(ctx.tag);
        self.declared_vr = Some(ctx.declared_vr);
        self.position = ctx.position;
        self
    }

    /// Attach a copy of the offending value bytes.
    pub fn with_raw_bytes(mut self, bytes: &[u8]) -> Self {
        self.raw_bytes = Some(bytes.to_vec());
        self
    }

    /// Attach the value representation the dictionary expects.
    pub fn with_expected_vr(mut self, vr: VR) -> Self {
        self.expected_vr = Some(vr);
        self
    }

    /// Attach a repair suggestion.
    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    /// Attach a tag and stream position.
    pub fn with_tag_position(mut self, tag: Tag, position: u64) -> Self {
        self.tag = Some(tag);
        self.position = position;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.code)?;
        if let Some(tag) = self.tag {
            write!(f, " at {}", tag)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// The aggregated outcome of a validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether the content is valid:
    /// true iff no error-severity issue was found.
    pub fn valid(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|issue| issue.severity == Severity::Error)
    }

    /// The collected issues, in discovery order.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Append an issue to the report.
    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Number of collected issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{}", issue)?;
        }
        Ok(())
    }
}

/// The context handed to each rule for one decoded element.
///
/// Rules are pure functions of this context and must not retain
/// references to the raw bytes past the call.
pub struct RuleContext<'a> {
    /// The element tag.
    pub tag: Tag,
    /// The value representation the element was decoded with.
    pub declared_vr: VR,
    /// The dictionary's value representation for the tag, if known.
    pub dictionary_vr: Option<VirtualVr>,
    /// The verbatim value bytes.
    pub value: &'a [u8],
    /// The data set the element belongs to, as built so far.
    pub dataset: &'a Dataset,
    /// The character set in force for the data set.
    pub charset: &'a SpecificCharacterSet,
    /// The stream position of the first value byte.
    pub position: u64,
    /// Whether the element belongs to a private group.
    pub is_private: bool,
    /// The private creator owning the element, if registered.
    pub private_creator: Option<&'a str>,
}

/// A validation rule.
pub trait ValidationRule: Send + Sync {
    /// The stable identifier of the rule.
    fn id(&self) -> &'static str;

    /// A short description of what the rule checks.
    fn description(&self) -> &'static str;

    /// Inspect one element, producing at most one issue.
    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue>;
}

/// What to do with the issues a rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    /// Abort parsing on error-severity issues.
    Validate,
    /// Downgrade error-severity issues to warnings and continue.
    #[default]
    Warn,
    /// Do not evaluate rules for the element at all.
    Skip,
}

/// A bundle of rules with a default behavior
/// and optional per-tag behavior overrides.
#[derive(Clone)]
pub struct ValidationProfile {
    rules: Vec<Arc<dyn ValidationRule>>,
    default_behavior: Behavior,
    overrides: HashMap<Tag, Behavior>,
}

impl fmt::Debug for ValidationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationProfile")
            .field("rules", &self.rules.iter().map(|r| r.id()).collect::<Vec<_>>())
            .field("default_behavior", &self.default_behavior)
            .field("overrides", &self.overrides)
            .finish()
    }
}

impl ValidationProfile {
    /// Create a profile from a rule list and a default behavior.
    pub fn new(rules: Vec<Arc<dyn ValidationRule>>, default_behavior: Behavior) -> Self {
        ValidationProfile {
            rules,
            default_behavior,
            overrides: HashMap::new(),
        }
    }

    /// All built-in rules with the [`Behavior::Validate`] behavior.
    pub fn strict() -> Self {
        ValidationProfile::new(built_in_rules(), Behavior::Validate)
    }

    /// All built-in rules with the [`Behavior::Warn`] behavior.
    pub fn lenient() -> Self {
        ValidationProfile::new(built_in_rules(), Behavior::Warn)
    }

    /// Structural rules only, with the [`Behavior::Skip`] behavior:
    /// nothing aborts, only length and padding notes are produced
    /// for elements explicitly opted into validation.
    pub fn permissive() -> Self {
        ValidationProfile::new(
            vec![Arc::new(EvenLengthRule), Arc::new(PaddingRule)],
            Behavior::Skip,
        )
    }

    /// Append a rule to the profile.
    pub fn with_rule(mut self, rule: Arc<dyn ValidationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Override the behavior for one specific tag.
    pub fn override_tag(mut self, tag: Tag, behavior: Behavior) -> Self {
        self.overrides.insert(tag, behavior);
        self
    }

    /// The effective behavior for the given tag.
    pub fn behavior_for(&self, tag: Tag) -> Behavior {
        self.overrides
            .get(&tag)
            .copied()
            .unwrap_or(self.default_behavior)
    }

    /// The rules of the profile, in evaluation order.
    pub fn rules(&self) -> &[Arc<dyn ValidationRule>] {
        &self.rules
    }
}

/// A callback invoked for every issue;
/// returning `false` aborts parsing.
pub type IssueCallback = Arc<dyn Fn(&ValidationIssue) -> bool + Send + Sync>;

/// The validation profile selection of a read operation.
#[derive(Clone, Default)]
pub enum ProfileChoice {
    /// All rules, aborting on violations.
    Strict,
    /// All rules, collecting warnings.
    Lenient,
    /// Structural notes only.
    Permissive,
    /// No rule evaluation.
    #[default]
    None,
    /// A caller-provided profile.
    Custom(Arc<ValidationProfile>),
}

impl fmt::Debug for ProfileChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileChoice::Strict => f.write_str("Strict"),
            ProfileChoice::Lenient => f.write_str("Lenient"),
            ProfileChoice::Permissive => f.write_str("Permissive"),
            ProfileChoice::None => f.write_str("None"),
            ProfileChoice::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Validation configuration of a read operation.
#[derive(Clone)]
pub struct ValidationOptions {
    /// The profile to evaluate.
    pub profile: ProfileChoice,
    /// A callback with the last word on every issue.
    pub callback: Option<IssueCallback>,
    /// Whether issues are accumulated into the read result.
    /// Independent of the profile choice.
    pub collect_issues: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            profile: ProfileChoice::default(),
            callback: None,
            collect_issues: true,
        }
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("profile", &self.profile)
            .field("callback", &self.callback.as_ref().map(|_| ".."))
            .field("collect_issues", &self.collect_issues)
            .finish()
    }
}

/// The reason a validation engine run stopped the parse.
#[derive(Debug)]
pub enum ValidationAbort {
    /// An error-severity issue under the Validate behavior.
    Failed(ValidationIssue),
    /// The callback returned `false`.
    Cancelled,
}

/// The driver evaluating a profile over decoded elements,
/// accumulating the report.
pub(crate) struct Validator {
    profile: Option<Arc<ValidationProfile>>,
    strict: bool,
    callback: Option<IssueCallback>,
    collect: bool,
    report: ValidationReport,
}

impl Validator {
    pub(crate) fn new(options: &ValidationOptions) -> Self {
        let (profile, strict) = match &options.profile {
            ProfileChoice::Strict => (Some(Arc::new(ValidationProfile::strict())), true),
            ProfileChoice::Lenient => (Some(Arc::new(ValidationProfile::lenient())), false),
            ProfileChoice::Permissive => (Some(Arc::new(ValidationProfile::permissive())), false),
            ProfileChoice::None => (None, false),
            ProfileChoice::Custom(profile) => (Some(Arc::clone(profile)), false),
        };
        Validator {
            profile,
            strict,
            callback: options.callback.clone(),
            collect: options.collect_issues,
            report: ValidationReport::default(),
        }
    }

    /// Whether unknown character set terms should fail the parse.
    pub(crate) fn strict_charset(&self) -> bool {
        self.strict
    }

    /// Offer one issue to the collection, the callback,
    /// and the abort decision.
    pub(crate) fn report_issue(
        &mut self,
        behavior: Behavior,
        mut issue: ValidationIssue,
    ) -> Result<(), ValidationAbort> {
        if behavior == Behavior::Warn && issue.severity == Severity::Error {
            issue.severity = Severity::Warning;
        }
        if self.collect {
            self.report.push(issue.clone());
        }
        if let Some(callback) = &self.callback {
            if !callback(&issue) {
                return Err(ValidationAbort::Cancelled);
            }
        }
        if behavior == Behavior::Validate && issue.severity == Severity::Error {
            return Err(ValidationAbort::Failed(issue));
        }
        Ok(())
    }

    /// Offer an engine-generated note (not tied to a rule).
    pub(crate) fn note(&mut self, issue: ValidationIssue) -> Result<(), ValidationAbort> {
        let behavior = self
            .profile
            .as_ref()
            .map(|p| p.default_behavior)
            .unwrap_or(Behavior::Warn);
        self.report_issue(behavior, issue)
    }

    /// Evaluate the profile's rules over one decoded element.
    pub(crate) fn element(&mut self, ctx: &RuleContext) -> Result<(), ValidationAbort> {
        let Some(profile) = self.profile.clone() else {
            return Ok(());
        };
        let behavior = profile.behavior_for(ctx.tag);
        if behavior == Behavior::Skip {
            return Ok(());
        }
        for rule in profile.rules() {
            if let Some(issue) = rule.validate(ctx) {
                self.report_issue(behavior, issue)?;
            }
        }
        Ok(())
    }

    pub(crate) fn into_report(self) -> ValidationReport {
        self.report
    }
}

/// Validate a complete data set against a profile,
/// without reparsing it. Stream positions in the resulting
/// issues are zero.
pub fn validate(dataset: &Dataset, profile: &ValidationProfile) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_into(dataset, profile, &mut report);
    report
}

fn validate_into(dataset: &Dataset, profile: &ValidationProfile, report: &mut ValidationReport) {
    use dcmkit_core::dictionary::DataDictionary;
    use dcmkit_core::value::Value;
    use dcmkit_dictionary_std::StandardDataDictionary;

    for element in dataset.iter() {
        let tag = dcmkit_core::header::Header::tag(element);
        let behavior = profile.behavior_for(tag);
        match element.value() {
            Value::Primitive(value) => {
                if behavior == Behavior::Skip {
                    continue;
                }
                let ctx = RuleContext {
                    tag,
                    declared_vr: element.vr(),
                    dictionary_vr: StandardDataDictionary.by_tag(tag).map(|e| e.vr),
                    value: value.as_slice(),
                    dataset,
                    charset: dataset.charset(),
                    position: 0,
                    is_private: tag.is_private(),
                    private_creator: tag
                        .private_creator_slot()
                        .and_then(|slot| dataset.private_creator(tag.group(), slot)),
                };
                for rule in profile.rules() {
                    if let Some(mut issue) = rule.validate(&ctx) {
                        if behavior == Behavior::Warn && issue.severity == Severity::Error {
                            issue.severity = Severity::Warning;
                        }
                        report.push(issue);
                    }
                }
            }
            Value::Sequence(seq) => {
                for item in seq.items() {
                    validate_into(item, profile, report);
                }
            }
            _ => {}
        }
    }
}

fn built_in_rules() -> Vec<Arc<dyn ValidationRule>> {
    vec![
        Arc::new(DateFormatRule),
        Arc::new(TimeFormatRule),
        Arc::new(DateTimeFormatRule),
        Arc::new(UidFormatRule),
        Arc::new(AgeFormatRule),
        Arc::new(PersonNameRule),
        Arc::new(CodeStringRule),
        Arc::new(TextRepertoireRule),
        Arc::new(MaxLengthRule),
        Arc::new(VrConsistencyRule),
        Arc::new(EvenLengthRule),
        Arc::new(PaddingRule),
    ]
}

fn trimmed_components(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value.split(|b| *b == b'\\').map(|component| {
        let end = component
            .iter()
            .rposition(|b| *b != b' ' && *b != 0)
            .map(|p| p + 1)
            .unwrap_or(0);
        &component[..end]
    })
}

/// Checks that DA values name real calendar dates.
pub struct DateFormatRule;

impl ValidationRule for DateFormatRule {
    fn id(&self) -> &'static str {
        "value.da.format"
    }

    fn description(&self) -> &'static str {
        "Date values must be valid YYYYMMDD calendar dates"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        if ctx.declared_vr != VR::DA {
            return None;
        }
        for component in trimmed_components(ctx.value) {
            if component.is_empty() {
                continue;
            }
            let ok = component.len() == 8
                && component.iter().all(u8::is_ascii_digit)
                && parse_date(component).is_some();
            if !ok {
                return Some(
                    ValidationIssue::new(
                        self.id(),
                        Severity::Error,
                        format!(
                            "`{}` is not a valid DA value",
                            String::from_utf8_lossy(component)
                        ),
                    )
                    .for_element(ctx)
                    .with_raw_bytes(ctx.value),
                );
            }
        }
        None
    }
}

fn parse_date(component: &[u8]) -> Option<NaiveDate> {
    let text = std::str::from_utf8(component).ok()?;
    let year: i32 = text[0..4].parse().ok()?;
    let month: u32 = text[4..6].parse().ok()?;
    let day: u32 = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Checks the HHMMSS.FFFFFF shape of TM values.
pub struct TimeFormatRule;

impl ValidationRule for TimeFormatRule {
    fn id(&self) -> &'static str {
        "value.tm.format"
    }

    fn description(&self) -> &'static str {
        "Time values must follow the HHMMSS.FFFFFF format"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        if ctx.declared_vr != VR::TM {
            return None;
        }
        for component in trimmed_components(ctx.value) {
            if component.is_empty() {
                continue;
            }
            if !valid_time(component) {
                return Some(
                    ValidationIssue::new(
                        self.id(),
                        Severity::Error,
                        format!(
                            "`{}` is not a valid TM value",
                            String::from_utf8_lossy(component)
                        ),
                    )
                    .for_element(ctx)
                    .with_raw_bytes(ctx.value),
                );
            }
        }
        None
    }
}

fn valid_time(component: &[u8]) -> bool {
    let (clock, fraction) = match component.iter().position(|b| *b == b'.') {
        Some(p) => (&component[..p], &component[p + 1..]),
        None => (component, &[][..]),
    };
    if !clock.iter().all(u8::is_ascii_digit) || !fraction.iter().all(u8::is_ascii_digit) {
        return false;
    }
    if !matches!(clock.len(), 2 | 4 | 6) || fraction.len() > 6 {
        return false;
    }
    let digits = |range: &[u8]| -> u32 {
        std::str::from_utf8(range)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(99)
    };
    if digits(&clock[0..2]) > 23 {
        return false;
    }
    if clock.len() >= 4 && digits(&clock[2..4]) > 59 {
        return false;
    }
    // leap seconds allow 60
    if clock.len() == 6 && digits(&clock[4..6]) > 60 {
        return false;
    }
    true
}

/// Checks the date-and-time shape of DT values.
pub struct DateTimeFormatRule;

impl ValidationRule for DateTimeFormatRule {
    fn id(&self) -> &'static str {
        "value.dt.format"
    }

    fn description(&self) -> &'static str {
        "Date Time values must follow the YYYYMMDDHHMMSS&ZZXX format"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        if ctx.declared_vr != VR::DT {
            return None;
        }
        if validate_dt(ctx.value) != TextValidationOutcome::Ok {
            return Some(
                ValidationIssue::new(
                    self.id(),
                    Severity::Error,
                    "DT value contains characters outside its repertoire",
                )
                .for_element(ctx)
                .with_raw_bytes(ctx.value),
            );
        }
        for component in trimmed_components(ctx.value) {
            if component.is_empty() {
                continue;
            }
            // the leading digit run must cover at least the year
            // and pair up to a valid calendar prefix
            let digits: Vec<u8> = component
                .iter()
                .copied()
                .take_while(u8::is_ascii_digit)
                .collect();
            let valid = match digits.len() {
                0..=3 => false,
                4 | 6 => true,
                len if len >= 8 => parse_date(&digits[..8]).is_some(),
                _ => false,
            };
            if !valid {
                return Some(
                    ValidationIssue::new(
                        self.id(),
                        Severity::Error,
                        format!(
                            "`{}` is not a valid DT value",
                            String::from_utf8_lossy(component)
                        ),
                    )
                    .for_element(ctx)
                    .with_raw_bytes(ctx.value),
                );
            }
        }
        None
    }
}

/// Checks UID syntax: digits and dots, no empty components,
/// no leading zeros in multi-digit components.
pub struct UidFormatRule;

impl ValidationRule for UidFormatRule {
    fn id(&self) -> &'static str {
        "value.ui.format"
    }

    fn description(&self) -> &'static str {
        "UID values must be dot-separated numeric components"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        if ctx.declared_vr != VR::UI {
            return None;
        }
        for component in ctx.value.split(|b| *b == b'\\') {
            let text = String::from_utf8_lossy(component);
            let text = text.trim_end_matches('\0');
            if text.is_empty() {
                continue;
            }
            if let Err(e) = validate_uid(text) {
                return Some(
                    ValidationIssue::new(self.id(), Severity::Error, e.to_string())
                        .for_element(ctx)
                        .with_raw_bytes(ctx.value),
                );
            }
        }
        None
    }
}

/// Checks the nnnD/W/M/Y shape of AS values.
pub struct AgeFormatRule;

impl ValidationRule for AgeFormatRule {
    fn id(&self) -> &'static str {
        "value.as.format"
    }

    fn description(&self) -> &'static str {
        "Age String values must be three digits plus a D/W/M/Y unit"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        if ctx.declared_vr != VR::AS {
            return None;
        }
        for component in trimmed_components(ctx.value) {
            if component.is_empty() {
                continue;
            }
            let ok = component.len() == 4
                && component[..3].iter().all(u8::is_ascii_digit)
                && matches!(component[3], b'D' | b'W' | b'M' | b'Y');
            if !ok {
                return Some(
                    ValidationIssue::new(
                        self.id(),
                        Severity::Error,
                        format!(
                            "`{}` is not a valid AS value",
                            String::from_utf8_lossy(component)
                        ),
                    )
                    .for_element(ctx)
                    .with_raw_bytes(ctx.value),
                );
            }
        }
        None
    }
}

/// Checks the component group structure of PN values.
pub struct PersonNameRule;

impl ValidationRule for PersonNameRule {
    fn id(&self) -> &'static str {
        "value.pn.format"
    }

    fn description(&self) -> &'static str {
        "Person Name values must have at most three component groups of five components"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        if ctx.declared_vr != VR::PN {
            return None;
        }
        for person in trimmed_components(ctx.value) {
            let groups = person.split(|b| *b == b'=').count();
            let components_ok = person
                .split(|b| *b == b'=')
                .all(|group| group.split(|b| *b == b'^').count() <= 5);
            let repertoire_ok = !person
                .iter()
                .any(|b| b.is_ascii_control() && *b != 0x1B);
            if groups > 3 || !components_ok || !repertoire_ok {
                return Some(
                    ValidationIssue::new(
                        self.id(),
                        Severity::Error,
                        "PN value violates the component group structure",
                    )
                    .for_element(ctx)
                    .with_raw_bytes(ctx.value),
                );
            }
        }
        None
    }
}

/// Checks the uppercase repertoire of CS values.
pub struct CodeStringRule;

impl ValidationRule for CodeStringRule {
    fn id(&self) -> &'static str {
        "value.cs.repertoire"
    }

    fn description(&self) -> &'static str {
        "Code String values use uppercase letters, digits, space and underscore"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        if ctx.declared_vr != VR::CS {
            return None;
        }
        if validate_cs(ctx.value) != TextValidationOutcome::Ok {
            return Some(
                ValidationIssue::new(
                    self.id(),
                    Severity::Error,
                    "CS value contains characters outside its repertoire",
                )
                .for_element(ctx)
                .with_raw_bytes(ctx.value),
            );
        }
        None
    }
}

/// Checks that short text representations carry no control characters.
pub struct TextRepertoireRule;

impl ValidationRule for TextRepertoireRule {
    fn id(&self) -> &'static str {
        "value.text.repertoire"
    }

    fn description(&self) -> &'static str {
        "Text values must not contain control characters outside their repertoire"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        let allow_multiline = matches!(ctx.declared_vr, VR::ST | VR::LT | VR::UT);
        if !matches!(ctx.declared_vr, VR::AE | VR::SH | VR::LO | VR::ST | VR::LT | VR::UT) {
            return None;
        }
        let offending = ctx.value.iter().any(|b| {
            b.is_ascii_control()
                && *b != 0x1B
                && !(allow_multiline && matches!(b, 0x09 | 0x0A | 0x0C | 0x0D))
                && *b != 0
        });
        if offending {
            return Some(
                ValidationIssue::new(
                    self.id(),
                    Severity::Error,
                    format!("{} value contains control characters", ctx.declared_vr),
                )
                .for_element(ctx)
                .with_raw_bytes(ctx.value),
            );
        }
        None
    }
}

/// Checks the per-VR maximum value length.
pub struct MaxLengthRule;

impl ValidationRule for MaxLengthRule {
    fn id(&self) -> &'static str {
        "value.length.maximum"
    }

    fn description(&self) -> &'static str {
        "Each value must fit the maximum length of its representation"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        let meta = ctx.declared_vr.meta();
        if meta.max_length == 0 {
            return None;
        }
        let oversized = if meta.delimiter.is_some() && meta.is_text {
            trimmed_components(ctx.value).any(|c| c.len() as u32 > meta.max_length)
        } else {
            ctx.value.len() as u32 > meta.max_length
        };
        if oversized {
            return Some(
                ValidationIssue::new(
                    self.id(),
                    Severity::Error,
                    format!(
                        "value exceeds the maximum length of {} bytes for {}",
                        meta.max_length, ctx.declared_vr
                    ),
                )
                .for_element(ctx),
            );
        }
        None
    }
}

/// Checks the declared VR against the dictionary's expectation.
pub struct VrConsistencyRule;

impl ValidationRule for VrConsistencyRule {
    fn id(&self) -> &'static str {
        "element.vr.mismatch"
    }

    fn description(&self) -> &'static str {
        "The declared VR should match the dictionary"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        let dictionary_vr = ctx.dictionary_vr?;
        if ctx.declared_vr == VR::UN {
            return None;
        }
        let consistent = match dictionary_vr {
            VirtualVr::Exact(vr) => vr == ctx.declared_vr,
            VirtualVr::Xs => matches!(ctx.declared_vr, VR::US | VR::SS),
            VirtualVr::Ox | VirtualVr::Px => matches!(ctx.declared_vr, VR::OB | VR::OW),
            VirtualVr::Lt => matches!(ctx.declared_vr, VR::US | VR::OW | VR::SS),
        };
        if !consistent {
            return Some(
                ValidationIssue::new(
                    self.id(),
                    Severity::Warning,
                    format!(
                        "element declares VR {} but the dictionary expects {}",
                        ctx.declared_vr,
                        dictionary_vr.relaxed()
                    ),
                )
                .for_element(ctx)
                .with_expected_vr(dictionary_vr.relaxed()),
            );
        }
        None
    }
}

/// Notes values of odd length.
pub struct EvenLengthRule;

impl ValidationRule for EvenLengthRule {
    fn id(&self) -> &'static str {
        "element.length.even"
    }

    fn description(&self) -> &'static str {
        "Value lengths should be even"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        if ctx.value.len() % 2 != 0 {
            return Some(
                ValidationIssue::new(
                    self.id(),
                    Severity::Info,
                    format!("value has an odd length of {} bytes", ctx.value.len()),
                )
                .for_element(ctx)
                .with_suggested_fix("pad the value to even length on write"),
            );
        }
        None
    }
}

/// Notes values padded with the wrong padding byte.
pub struct PaddingRule;

impl ValidationRule for PaddingRule {
    fn id(&self) -> &'static str {
        "value.padding"
    }

    fn description(&self) -> &'static str {
        "Text values should be padded with the padding byte of their representation"
    }

    fn validate(&self, ctx: &RuleContext) -> Option<ValidationIssue> {
        let meta = ctx.declared_vr.meta();
        if !meta.is_text || ctx.value.is_empty() {
            return None;
        }
        let last = *ctx.value.last().unwrap();
        let wrong_pad = (last == 0 || last == b' ') && last != meta.padding;
        if wrong_pad {
            return Some(
                ValidationIssue::new(
                    self.id(),
                    Severity::Info,
                    format!(
                        "value is padded with {:#04X} instead of {:#04X}",
                        last, meta.padding
                    ),
                )
                .for_element(ctx),
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::Dataset;

    fn ctx_for<'a>(
        dataset: &'a Dataset,
        charset: &'a SpecificCharacterSet,
        tag: Tag,
        vr: VR,
        value: &'a [u8],
    ) -> RuleContext<'a> {
        RuleContext {
            tag,
            declared_vr: vr,
            dictionary_vr: None,
            value,
            dataset,
            charset,
            position: 42,
            is_private: false,
            private_creator: None,
        }
    }

    #[test]
    fn date_rule_rejects_impossible_dates() {
        let dataset = Dataset::new();
        let charset = SpecificCharacterSet::default();
        let ctx = ctx_for(&dataset, &charset, Tag(0x0008, 0x0020), VR::DA, b"20240230");
        let issue = DateFormatRule.validate(&ctx).expect("must be invalid");
        assert_eq!(issue.code, "value.da.format");
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.raw_bytes.as_deref(), Some(&b"20240230"[..]));

        let ctx = ctx_for(&dataset, &charset, Tag(0x0008, 0x0020), VR::DA, b"20240229");
        assert!(DateFormatRule.validate(&ctx).is_none());
    }

    #[test]
    fn time_rule() {
        let dataset = Dataset::new();
        let charset = SpecificCharacterSet::default();
        let ctx = ctx_for(&dataset, &charset, Tag(0x0008, 0x0030), VR::TM, b"236000");
        assert!(TimeFormatRule.validate(&ctx).is_some());
        let ctx = ctx_for(&dataset, &charset, Tag(0x0008, 0x0030), VR::TM, b"235959.123 ");
        assert!(TimeFormatRule.validate(&ctx).is_none());
    }

    #[test]
    fn uid_rule_flags_leading_zeros() {
        let dataset = Dataset::new();
        let charset = SpecificCharacterSet::default();
        let ctx = ctx_for(&dataset, &charset, Tag(0x0008, 0x0018), VR::UI, b"1.02.3\0");
        let issue = UidFormatRule.validate(&ctx).expect("must be invalid");
        assert_eq!(issue.code, "value.ui.format");
        assert_eq!(issue.position, 42);

        let ctx = ctx_for(&dataset, &charset, Tag(0x0008, 0x0018), VR::UI, b"1.2.3\0");
        assert!(UidFormatRule.validate(&ctx).is_none());
    }

    #[test]
    fn behavior_downgrades_and_aborts() {
        let mut validator = Validator::new(&ValidationOptions {
            profile: ProfileChoice::Lenient,
            callback: None,
            collect_issues: true,
        });
        let issue = ValidationIssue::new("value.da.format", Severity::Error, "bad");
        validator.report_issue(Behavior::Warn, issue).unwrap();
        let report = validator.into_report();
        assert_eq!(report.issues()[0].severity, Severity::Warning);
        assert!(report.valid());

        let mut validator = Validator::new(&ValidationOptions {
            profile: ProfileChoice::Strict,
            callback: None,
            collect_issues: true,
        });
        let issue = ValidationIssue::new("value.da.format", Severity::Error, "bad");
        let aborted = validator.report_issue(Behavior::Validate, issue);
        assert!(matches!(aborted, Err(ValidationAbort::Failed(_))));
    }

    #[test]
    fn callback_has_the_last_word() {
        let mut validator = Validator::new(&ValidationOptions {
            profile: ProfileChoice::Lenient,
            callback: Some(Arc::new(|_| false)),
            collect_issues: false,
        });
        let issue = ValidationIssue::new("value.tm.format", Severity::Info, "note");
        let aborted = validator.report_issue(Behavior::Warn, issue);
        assert!(matches!(aborted, Err(ValidationAbort::Cancelled)));
    }

    #[test]
    fn per_tag_behavior_override() {
        let profile = ValidationProfile::strict()
            .override_tag(Tag(0x0008, 0x0020), Behavior::Skip);
        assert_eq!(
            profile.behavior_for(Tag(0x0008, 0x0020)),
            Behavior::Skip
        );
        assert_eq!(profile.behavior_for(Tag(0x0008, 0x0030)), Behavior::Validate);
    }
}
