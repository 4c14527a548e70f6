//! Editor state for the console's create/edit panels and the drafts they hold.

use serde_json::Value;
use thiserror::Error;

use crate::adapter::PLACEHOLDER;
use crate::codec::{normalize_key, parse_key};
use crate::error::CoreError;
use crate::model::{
    Action, ApplicableAction, ConditionBlock, CreateGroupRequest, DefaultValuesMeta, Field,
    FieldOperatorValue, LogicalOperator, Rule, SmtpConfig, SmtpDetails, UpdateGroupRulesRequest,
    Webhook, WebhookAuth,
};
use crate::value::{NormalizedKey, TypedValue, ValueKind};

// --- State machine ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Create,
    Edit,
}

/// Form contents that can check themselves before submission.
pub trait Draft {
    /// The operator-facing message for the first problem found.
    fn validate(&self, mode: DraftMode) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormState<D> {
    Viewing,
    Creating { draft: D, error: Option<String> },
    Editing { id: String, draft: D, error: Option<String> },
    Saving { id: Option<String>, draft: D },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent<D> {
    StartCreate(D),
    StartEdit { id: String, draft: D },
    Edit(D),
    Submit,
    Saved,
    Failed(String),
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot apply {event} while {from}")]
pub struct TransitionError {
    pub from: &'static str,
    pub event: &'static str,
}

impl<D> Default for FormState<D> {
    fn default() -> Self {
        FormState::Viewing
    }
}

impl<D: Draft> FormState<D> {
    /// The single transition function. `Submit` validates the draft; a failed
    /// validation keeps the panel open with the message instead of saving.
    pub fn reduce(self, event: FormEvent<D>) -> Result<FormState<D>, TransitionError> {
        use FormEvent as E;
        use FormState as S;

        let from = self.name();
        let event_name = event.name();
        let next = match (self, event) {
            (S::Saving { .. }, E::Saved) => S::Viewing,
            (S::Saving { id: None, draft }, E::Failed(error)) => S::Creating {
                draft,
                error: Some(error),
            },
            (S::Saving { id: Some(id), draft }, E::Failed(error)) => S::Editing {
                id,
                draft,
                error: Some(error),
            },
            (S::Saving { .. }, _) => {
                return Err(TransitionError {
                    from,
                    event: event_name,
                })
            }

            (_, E::StartCreate(draft)) => S::Creating { draft, error: None },
            (_, E::StartEdit { id, draft }) => S::Editing {
                id,
                draft,
                error: None,
            },
            (_, E::Close) => S::Viewing,

            (S::Creating { .. }, E::Edit(draft)) => S::Creating { draft, error: None },
            (S::Editing { id, .. }, E::Edit(draft)) => S::Editing {
                id,
                draft,
                error: None,
            },

            (S::Creating { draft, .. }, E::Submit) => match draft.validate(DraftMode::Create) {
                Ok(()) => S::Saving { id: None, draft },
                Err(error) => S::Creating {
                    draft,
                    error: Some(error),
                },
            },
            (S::Editing { id, draft, .. }, E::Submit) => match draft.validate(DraftMode::Edit) {
                Ok(()) => S::Saving { id: Some(id), draft },
                Err(error) => S::Editing {
                    id,
                    draft,
                    error: Some(error),
                },
            },

            (S::Viewing, E::Edit(_) | E::Submit)
            | (S::Creating { .. } | S::Editing { .. } | S::Viewing, E::Saved | E::Failed(_)) => {
                return Err(TransitionError {
                    from,
                    event: event_name,
                })
            }
        };
        Ok(next)
    }
}

impl<D> FormState<D> {
    pub fn name(&self) -> &'static str {
        match self {
            FormState::Viewing => "viewing",
            FormState::Creating { .. } => "creating",
            FormState::Editing { .. } => "editing",
            FormState::Saving { .. } => "saving",
        }
    }

    pub fn draft(&self) -> Option<&D> {
        match self {
            FormState::Viewing => None,
            FormState::Creating { draft, .. }
            | FormState::Editing { draft, .. }
            | FormState::Saving { draft, .. } => Some(draft),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FormState::Creating { error, .. } | FormState::Editing { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub fn is_panel_open(&self) -> bool {
        !matches!(self, FormState::Viewing)
    }

    /// While saving: the record id being updated (`None` for a create) and the draft to send.
    pub fn submission(&self) -> Option<(Option<&str>, &D)> {
        match self {
            FormState::Saving { id, draft } => Some((id.as_deref(), draft)),
            _ => None,
        }
    }
}

impl<D> FormEvent<D> {
    pub fn name(&self) -> &'static str {
        match self {
            FormEvent::StartCreate(_) => "start-create",
            FormEvent::StartEdit { .. } => "start-edit",
            FormEvent::Edit(_) => "edit",
            FormEvent::Submit => "submit",
            FormEvent::Saved => "saved",
            FormEvent::Failed(_) => "failed",
            FormEvent::Close => "close",
        }
    }
}

/// Runs `Draft::validate` and wraps failures for `?` callers.
pub fn check<D: Draft>(draft: &D, mode: DraftMode) -> Result<(), CoreError> {
    draft.validate(mode).map_err(CoreError::Validation)
}

// --- Chips ---

/// Selected values for one condition or action, held as keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipSelection {
    keys: Vec<NormalizedKey>,
}

impl ChipSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preselects the backend's stored values.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut selection = Self::new();
        for v in values {
            selection.add(normalize_key(v));
        }
        selection
    }

    /// Adds a key unless it is empty or already selected. Returns whether it was added.
    pub fn add(&mut self, key: NormalizedKey) -> bool {
        if key.is_empty() || self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    /// Adds typed text as `"<KIND>:<text>"`; `STRING` when the kind is unknown.
    pub fn add_free_text(&mut self, kind: Option<ValueKind>, raw: &str) -> bool {
        let text = raw.trim();
        if text.is_empty() {
            return false;
        }
        let kind = kind.unwrap_or(ValueKind::String);
        self.add(NormalizedKey::new(format!("{}:{}", kind, text)))
    }

    pub fn remove(&mut self, key: &NormalizedKey) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != before
    }

    pub fn contains(&self, key: &NormalizedKey) -> bool {
        self.keys.contains(key)
    }

    pub fn keys(&self) -> &[NormalizedKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Keys converted back to values; keys without a kind prefix are dropped.
    pub fn to_values(&self) -> Vec<TypedValue> {
        self.keys
            .iter()
            .filter_map(|k| {
                let parsed = parse_key(k.as_str());
                if parsed.is_none() {
                    tracing::debug!(key = %k, "dropping untyped chip key");
                }
                parsed
            })
            .collect()
    }

    /// First value that cannot be sent as `kind`: a non-finite number, or a
    /// value that degraded to some other kind while parsing.
    pub fn first_unusable(&self, kind: Option<ValueKind>) -> Option<TypedValue> {
        self.to_values()
            .into_iter()
            .find(|v| !v.is_submittable() || kind.is_some_and(|k| v.kind() != k))
    }
}

/// Splits comma-separated text, trimming and dropping empty entries.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn declared_type(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

// --- Rule drafts ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionRow {
    pub field_id: String,
    pub field_name: String,
    pub field_type: String,
    pub operator: String,
    pub values: ChipSelection,
}

impl ConditionRow {
    /// Switches the row to `field`, picking its default operator and clearing values.
    pub fn select_field(&mut self, field: &Field, meta: &DefaultValuesMeta) {
        self.field_id = field.id.clone();
        self.field_name = field.name.clone();
        self.field_type = field.field_type.clone();
        self.operator = meta
            .default_operator(&field.field_type)
            .unwrap_or_default()
            .to_string();
        self.values.clear();
    }

    pub fn kind(&self) -> Option<ValueKind> {
        ValueKind::from_declared(&self.field_type)
    }

    pub fn to_payload(&self) -> FieldOperatorValue {
        FieldOperatorValue {
            field_id: self.field_id.clone(),
            data_type: declared_type(&self.field_type),
            operator: self.operator.clone(),
            default_values: self.values.to_values(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionRow {
    pub action_id: String,
    pub action_name: String,
    pub action_field_type: String,
    pub values: ChipSelection,
}

impl ActionRow {
    pub fn select_action(&mut self, action: &Action) {
        self.action_id = action.id.clone();
        self.action_name = [&action.field_name, &action.comment, &action.id]
            .into_iter()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        self.action_field_type = action.field_type.clone();
        self.values.clear();
    }

    pub fn kind(&self) -> Option<ValueKind> {
        ValueKind::from_declared(&self.action_field_type)
    }

    pub fn to_payload(&self) -> ApplicableAction {
        ApplicableAction {
            id: self.action_id.clone(),
            field_type: declared_type(&self.action_field_type),
            values: self.values.to_values(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    /// Optional id typed by the operator when creating.
    pub rule_id: String,
    pub group_id: String,
    pub rule_name: String,
    pub priority: i64,
    pub logical_operator: LogicalOperator,
    pub all: Vec<ConditionRow>,
    pub any: Vec<ConditionRow>,
    pub actions: Vec<ActionRow>,
    pub webhook_id: String,
    pub smtp_id: String,
    pub smtp_recipients: String,
    pub smtp_subject: String,
    pub smtp_body: String,
    pub description: String,
}

impl Default for RuleDraft {
    fn default() -> Self {
        RuleDraft {
            rule_id: String::new(),
            group_id: String::new(),
            rule_name: String::new(),
            priority: 1,
            logical_operator: LogicalOperator::And,
            all: vec![ConditionRow::default()],
            any: Vec::new(),
            actions: vec![ActionRow::default()],
            webhook_id: String::new(),
            smtp_id: String::new(),
            smtp_recipients: String::new(),
            smtp_subject: String::new(),
            smtp_body: String::new(),
            description: String::new(),
        }
    }
}

fn validate_block(rows: &[ConditionRow], block: &str) -> Result<(), String> {
    for (i, row) in rows.iter().enumerate() {
        let n = i + 1;
        if row.field_id.is_empty() {
            return Err(format!("{block}: field is required (row {n})"));
        }
        if row.operator.is_empty() {
            return Err(format!("{block}: operator is required (row {n})"));
        }
        if row.values.to_values().is_empty() {
            return Err(format!("{block}: select/enter at least one value (row {n})"));
        }
        if let Some(bad) = row.values.first_unusable(row.kind()) {
            return Err(format!(
                "{block}: \"{}\" is not a valid {} value (row {n})",
                bad.label(),
                declared_type(&row.field_type)
            ));
        }
    }
    Ok(())
}

impl Draft for RuleDraft {
    fn validate(&self, _mode: DraftMode) -> Result<(), String> {
        if self.group_id.trim().is_empty() {
            return Err("group_id is required".to_string());
        }
        if self.rule_name.trim().is_empty() {
            return Err("rule_name is required".to_string());
        }
        validate_block(&self.all, "ALL block")?;
        validate_block(&self.any, "ANY block")?;

        for (i, row) in self.actions.iter().enumerate() {
            let n = i + 1;
            if row.action_id.is_empty() {
                return Err(format!("Actions: action is required (row {n})"));
            }
            if !row.action_field_type.trim().is_empty() && row.values.to_values().is_empty() {
                let name = if row.action_name.is_empty() {
                    &row.action_id
                } else {
                    &row.action_name
                };
                return Err(format!("Actions: enter/select value(s) for \"{name}\" (row {n})"));
            }
            if let Some(bad) = row.values.first_unusable(row.kind()) {
                return Err(format!(
                    "Actions: \"{}\" is not a valid {} value (row {n})",
                    bad.label(),
                    declared_type(&row.action_field_type)
                ));
            }
        }
        Ok(())
    }
}

impl RuleDraft {
    /// Loads an existing rule into the editor.
    pub fn from_rule(rule: &Rule) -> Self {
        let rows = |op: LogicalOperator| -> Vec<ConditionRow> {
            rule.block(op)
                .map(|b| {
                    b.field_operator_values
                        .iter()
                        .map(|fov| ConditionRow {
                            field_id: fov.field_id.clone(),
                            field_name: String::new(),
                            field_type: fov.data_type.clone(),
                            operator: fov.operator.clone(),
                            values: selection_of(&fov.default_values),
                        })
                        .collect()
                })
                .unwrap_or_default()
        };
        let smtp = rule.smtp_details.clone().unwrap_or_default();

        RuleDraft {
            rule_id: rule.id.clone().unwrap_or_default(),
            group_id: rule.group_id.clone(),
            rule_name: rule.rule_name.clone(),
            priority: rule.priority,
            logical_operator: rule.logical_operator,
            all: rows(LogicalOperator::And),
            any: rows(LogicalOperator::Or),
            actions: rule
                .applicable_actions
                .iter()
                .map(|a| ActionRow {
                    action_id: a.id.clone(),
                    action_name: String::new(),
                    action_field_type: a.field_type.clone(),
                    values: selection_of(&a.values),
                })
                .collect(),
            webhook_id: rule.webhook_id.clone().unwrap_or_default(),
            smtp_id: smtp.id,
            smtp_recipients: smtp.recipient_ids.join(", "),
            smtp_subject: smtp.subject,
            smtp_body: smtp.body,
            description: rule.description.clone(),
        }
    }

    /// Builds the save payload. `existing_id` is the id being edited, if any;
    /// otherwise a typed `rule_id` is sent for a create.
    pub fn to_payload(&self, existing_id: Option<&str>) -> Rule {
        let id = match existing_id {
            Some(id) => Some(id.to_string()),
            None => Some(self.rule_id.trim().to_string()).filter(|s| !s.is_empty()),
        };

        let has_smtp = !self.smtp_id.is_empty()
            || !self.smtp_recipients.trim().is_empty()
            || !self.smtp_subject.trim().is_empty()
            || !self.smtp_body.trim().is_empty();

        Rule {
            id,
            group_id: self.group_id.trim().to_string(),
            rule_name: self.rule_name.trim().to_string(),
            priority: self.priority,
            logical_operator: self.logical_operator,
            conditions: vec![
                ConditionBlock {
                    logical_operator: LogicalOperator::And,
                    field_operator_values: self.all.iter().map(ConditionRow::to_payload).collect(),
                },
                ConditionBlock {
                    logical_operator: LogicalOperator::Or,
                    field_operator_values: self.any.iter().map(ConditionRow::to_payload).collect(),
                },
            ],
            applicable_actions: self
                .actions
                .iter()
                .filter(|a| !a.action_id.is_empty())
                .map(ActionRow::to_payload)
                .collect(),
            webhook_id: Some(self.webhook_id.clone()).filter(|s| !s.is_empty()),
            smtp_details: has_smtp.then(|| SmtpDetails {
                id: self.smtp_id.clone(),
                recipient_ids: split_list(&self.smtp_recipients),
                subject: self.smtp_subject.clone(),
                body: self.smtp_body.clone(),
            }),
            description: self.description.trim().to_string(),
        }
    }
}

fn selection_of(values: &[TypedValue]) -> ChipSelection {
    let mut selection = ChipSelection::new();
    for v in values {
        selection.add(v.key());
    }
    selection
}

// --- Resource drafts ---

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDraft {
    pub id: String,
    pub name: String,
    pub field_type: String,
    /// Comma-separated picklist values.
    pub values_text: String,
    pub comment: String,
}

impl Default for FieldDraft {
    fn default() -> Self {
        FieldDraft {
            id: String::new(),
            name: String::new(),
            field_type: ValueKind::String.as_str().to_string(),
            values_text: String::new(),
            comment: String::new(),
        }
    }
}

impl Draft for FieldDraft {
    fn validate(&self, mode: DraftMode) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Field name is required".to_string());
        }
        if self.field_type.trim().is_empty() {
            return Err("Field type is required".to_string());
        }
        if mode == DraftMode::Edit && self.id.trim().is_empty() {
            return Err("Field id is required".to_string());
        }
        Ok(())
    }
}

impl FieldDraft {
    pub fn from_field(field: &Field) -> Self {
        FieldDraft {
            id: field.id.clone(),
            name: field.name.clone(),
            field_type: if field.field_type.is_empty() {
                ValueKind::String.as_str().to_string()
            } else {
                field.field_type.clone()
            },
            values_text: field
                .values
                .iter()
                .map(crate::codec::label)
                .collect::<Vec<_>>()
                .join(", "),
            comment: field.comment.clone(),
        }
    }

    pub fn to_payload(&self) -> Field {
        Field {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            field_type: self.field_type.clone(),
            values: split_list(&self.values_text)
                .into_iter()
                .map(Value::String)
                .collect(),
            comment: self.comment.trim().to_string(),
            db_status: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmtpDraft {
    pub config_name: String,
    pub mail_host: String,
    /// Kept as text until submit, like the form input.
    pub mail_port: String,
    pub mail_username: String,
    pub mail_app_password: String,
}

impl Draft for SmtpDraft {
    fn validate(&self, _mode: DraftMode) -> Result<(), String> {
        if self.config_name.trim().is_empty() {
            return Err("config_name is required".to_string());
        }
        if self.mail_host.trim().is_empty() {
            return Err("mail_host is required".to_string());
        }
        if self.mail_port.trim().parse::<u16>().is_err() {
            return Err("mail_port must be a number".to_string());
        }
        if self.mail_username.trim().is_empty() {
            return Err("mail_username is required".to_string());
        }
        if self.mail_app_password.trim().is_empty() {
            return Err("mail_app_password is required".to_string());
        }
        Ok(())
    }
}

impl SmtpDraft {
    pub fn from_config(config: &SmtpConfig) -> Self {
        SmtpDraft {
            config_name: config.config_name.clone(),
            mail_host: config.mail_host.clone(),
            mail_port: config.mail_port.to_string(),
            mail_username: config.mail_username.clone(),
            mail_app_password: config.mail_app_password.clone(),
        }
    }

    pub fn to_payload(&self, id: Option<&str>) -> Result<SmtpConfig, CoreError> {
        let mail_port = self
            .mail_port
            .trim()
            .parse::<u16>()
            .map_err(|_| CoreError::Validation("mail_port must be a number".to_string()))?;
        Ok(SmtpConfig {
            id: id.map(str::to_string),
            config_name: self.config_name.trim().to_string(),
            mail_host: self.mail_host.trim().to_string(),
            mail_port,
            mail_username: self.mail_username.trim().to_string(),
            mail_app_password: self.mail_app_password.clone(),
        })
    }
}

/// Webhook editor contents. Method and timeout are already typed, so only
/// presence and auth requirements are checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookDraft(pub Webhook);

impl Draft for WebhookDraft {
    fn validate(&self, mode: DraftMode) -> Result<(), String> {
        let hook = &self.0;
        let blank = |s: &str| s.trim().is_empty();

        if mode == DraftMode::Create && blank(&hook.id) {
            return Err("Webhook id is required".to_string());
        }
        if blank(&hook.name) {
            return Err("Webhook name is required".to_string());
        }
        if blank(&hook.url) {
            return Err("Webhook URL is required".to_string());
        }
        if !hook.url.trim().to_ascii_lowercase().starts_with("https://") {
            return Err("Webhook URL must start with https://".to_string());
        }
        if hook.timeout_ms == 0 {
            return Err("timeout_ms must be a number".to_string());
        }
        match hook.auth_type {
            WebhookAuth::None => {}
            WebhookAuth::ApiKey => {
                if blank(&hook.auth_apikey_header) {
                    return Err("authApikeyHeader is required".to_string());
                }
                if blank(&hook.auth_api_key_value) {
                    return Err("authApiKeyValue is required".to_string());
                }
            }
            WebhookAuth::Basic => {
                if blank(&hook.auth_username) {
                    return Err("authUsername is required".to_string());
                }
                if blank(&hook.auth_password) {
                    return Err("authPassword is required".to_string());
                }
            }
            WebhookAuth::Jwt => {
                if blank(&hook.auth_jwt_token) {
                    return Err("authJwtToken is required".to_string());
                }
            }
        }
        if hook.body_fields.is_empty() {
            return Err("Add at least one body field".to_string());
        }
        if hook.body_fields.iter().any(|f| blank(&f.key)) {
            return Err("Body field key cannot be empty".to_string());
        }
        Ok(())
    }
}

impl WebhookDraft {
    pub fn to_payload(&self) -> Webhook {
        let mut hook = self.0.clone();
        hook.id = hook.id.trim().to_string();
        hook.name = hook.name.trim().to_string();
        hook.url = hook.url.trim().to_string();
        for field in &mut hook.body_fields {
            field.key = field.key.trim().to_string();
        }
        hook
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupDraft {
    pub group_name: String,
    pub parent_group_id: String,
}

impl Draft for GroupDraft {
    fn validate(&self, _mode: DraftMode) -> Result<(), String> {
        if self.group_name.trim().is_empty() {
            return Err("Group name is required".to_string());
        }
        Ok(())
    }
}

impl GroupDraft {
    pub fn to_payload(&self) -> CreateGroupRequest {
        CreateGroupRequest {
            group_name: self.group_name.trim().to_string(),
            parent_group_id: Some(self.parent_group_id.trim().to_string()).filter(|s| !s.is_empty()),
        }
    }
}

/// Reassigns which rules belong to a group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupRulesDraft {
    pub id: String,
    pub group_name: String,
    /// Comma-separated rule ids.
    pub rules_text: String,
}

impl Draft for GroupRulesDraft {
    fn validate(&self, _mode: DraftMode) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Select a group first".to_string());
        }
        Ok(())
    }
}

impl GroupRulesDraft {
    pub fn to_payload(&self) -> UpdateGroupRulesRequest {
        UpdateGroupRulesRequest {
            id: self.id.clone(),
            group_name: self.group_name.clone(),
            rules_ids: split_list(&self.rules_text),
        }
    }
}
