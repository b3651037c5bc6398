/// Report aggregation: the categorized issue lists and the final variable
/// tables handed back to the caller.
use std::collections::BTreeMap;

use serde::ser::Serializer;
use serde::Serialize;

use crate::ast::Position;
use crate::state::State;
use crate::types::PathId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueKind {
    ParserFailure,
    UnconnectedBlocks,
    EmptyBody,
    UnnecessaryPass,
    UnreadVariables,
    UndefinedVariables,
    PossiblyUndefinedVariables,
    OverwrittenVariables,
    AppendToNonList,
    UsedIterationList,
    UnusedIterationVariable,
    NonListIterations,
    EmptyIterations,
    TypeChanges,
    IterationVariableIsIterationList,
    UnknownFunctions,
    NotAFunction,
    ActionAfterReturn,
    IncompatibleTypes,
    ReturnOutsideFunction,
    ReadOutOfScope,
    WriteOutOfScope,
    AliasedBuiltin,
    MethodNotInType,
}

impl IssueKind {
    pub const ALL: [IssueKind; 24] = [
        IssueKind::ParserFailure,
        IssueKind::UnconnectedBlocks,
        IssueKind::EmptyBody,
        IssueKind::UnnecessaryPass,
        IssueKind::UnreadVariables,
        IssueKind::UndefinedVariables,
        IssueKind::PossiblyUndefinedVariables,
        IssueKind::OverwrittenVariables,
        IssueKind::AppendToNonList,
        IssueKind::UsedIterationList,
        IssueKind::UnusedIterationVariable,
        IssueKind::NonListIterations,
        IssueKind::EmptyIterations,
        IssueKind::TypeChanges,
        IssueKind::IterationVariableIsIterationList,
        IssueKind::UnknownFunctions,
        IssueKind::NotAFunction,
        IssueKind::ActionAfterReturn,
        IssueKind::IncompatibleTypes,
        IssueKind::ReturnOutsideFunction,
        IssueKind::ReadOutOfScope,
        IssueKind::WriteOutOfScope,
        IssueKind::AliasedBuiltin,
        IssueKind::MethodNotInType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::ParserFailure => "Parser Failure",
            IssueKind::UnconnectedBlocks => "Unconnected blocks",
            IssueKind::EmptyBody => "Empty Body",
            IssueKind::UnnecessaryPass => "Unnecessary Pass",
            IssueKind::UnreadVariables => "Unread variables",
            IssueKind::UndefinedVariables => "Undefined variables",
            IssueKind::PossiblyUndefinedVariables => "Possibly undefined variables",
            IssueKind::OverwrittenVariables => "Overwritten variables",
            IssueKind::AppendToNonList => "Append to non-list",
            IssueKind::UsedIterationList => "Used iteration list",
            IssueKind::UnusedIterationVariable => "Unused iteration variable",
            IssueKind::NonListIterations => "Non-list iterations",
            IssueKind::EmptyIterations => "Empty iterations",
            IssueKind::TypeChanges => "Type changes",
            IssueKind::IterationVariableIsIterationList => {
                "Iteration variable is iteration list"
            }
            IssueKind::UnknownFunctions => "Unknown functions",
            IssueKind::NotAFunction => "Not a function",
            IssueKind::ActionAfterReturn => "Action after return",
            IssueKind::IncompatibleTypes => "Incompatible types",
            IssueKind::ReturnOutsideFunction => "Return outside function",
            IssueKind::ReadOutOfScope => "Read out of scope",
            IssueKind::WriteOutOfScope => "Write out of scope",
            IssueKind::AliasedBuiltin => "Aliased built-in",
            IssueKind::MethodNotInType => "Method not in Type",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IssueKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Payload of one reported issue. Every field is optional; each issue kind
/// fills the subset that makes sense for it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl IssueData {
    pub fn at(position: Position) -> IssueData {
        IssueData {
            position: Some(position),
            ..IssueData::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> IssueData {
        self.name = Some(name.into());
        self
    }

    pub fn in_scope(mut self, scope: impl Into<String>) -> IssueData {
        self.scope = Some(scope.into());
        self
    }

    pub fn of_type(mut self, type_name: impl Into<String>) -> IssueData {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn changed(mut self, old: impl Into<String>, new: impl Into<String>) -> IssueData {
        self.old = Some(old.into());
        self.new = Some(new.into());
        self
    }

    pub fn operands(mut self, left: impl Into<String>, right: impl Into<String>) -> IssueData {
        self.left = Some(left.into());
        self.right = Some(right.into());
        self
    }

    pub fn operation(mut self, operation: impl Into<String>) -> IssueData {
        self.operation = Some(operation.into());
        self
    }
}

/// The analyzer's complete output for one source unit.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub issues: BTreeMap<IssueKind, Vec<IssueData>>,
    pub variables: BTreeMap<PathId, BTreeMap<String, State>>,
    #[serde(rename = "topLevelVariables")]
    pub top_level_variables: BTreeMap<String, State>,
}

impl Report {
    /// An empty report with every issue category seeded, so consumers can
    /// index any kind without presence checks.
    pub fn new() -> Report {
        let issues = IssueKind::ALL
            .iter()
            .map(|kind| (*kind, Vec::new()))
            .collect();
        Report {
            success: false,
            error: None,
            issues,
            variables: BTreeMap::new(),
            top_level_variables: BTreeMap::new(),
        }
    }

    /// Terminal failure: the analyzer (or the upstream parser) could not
    /// produce a usable result. Issue lists and variable tables stay empty.
    pub fn failure(error: impl Into<String>) -> Report {
        Report {
            error: Some(error.into()),
            ..Report::new()
        }
    }

    pub fn issue(&mut self, kind: IssueKind, data: IssueData) {
        self.issues.entry(kind).or_default().push(data);
    }

    pub fn issues_of(&self, kind: IssueKind) -> &[IssueData] {
        self.issues.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn issue_count(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }
}

impl Default for Report {
    fn default() -> Self {
        Report::new()
    }
}
