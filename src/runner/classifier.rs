use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Which archive tool operation produced the output being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Compress,
    Extract,
    List,
    Count,
}

impl OperationKind {
    /// Word used in failure messages (`"<target>: Compression failed"`).
    pub fn failure_noun(self) -> &'static str {
        match self {
            OperationKind::Compress => "Compression",
            OperationKind::Extract => "Extraction",
            OperationKind::List | OperationKind::Count => "Listing",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Compress => "compress",
            OperationKind::Extract => "extract",
            OperationKind::List => "list",
            OperationKind::Count => "count",
        };
        f.write_str(name)
    }
}

/// Fields of `7z l -slt` output that are forwarded to list callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    Solid,
    Path,
    Size,
    Crc,
    Attributes,
    Method,
}

impl ListField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Solid" => Some(ListField::Solid),
            "Path" => Some(ListField::Path),
            "Size" => Some(ListField::Size),
            "CRC" => Some(ListField::Crc),
            "Attributes" => Some(ListField::Attributes),
            "Method" => Some(ListField::Method),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ListField::Solid => "Solid",
            ListField::Path => "Path",
            ListField::Size => "Size",
            ListField::Crc => "CRC",
            ListField::Attributes => "Attributes",
            ListField::Method => "Method",
        }
    }
}

/// What a single output line means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Error,
    Compressing(String),
    Extracting(String),
    ListField { field: ListField, value: String },
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Error,
    Compressing,
    Extracting,
    ListField,
}

impl RuleKind {
    fn applies_to(self, operation: OperationKind) -> bool {
        match self {
            RuleKind::Error => true,
            RuleKind::Compressing => operation == OperationKind::Compress,
            RuleKind::Extracting => operation == OperationKind::Extract,
            RuleKind::ListField => operation == OperationKind::List,
        }
    }
}

/// Rules in priority order: the first matching rule decides the line.
const RULES: &[(RuleKind, &str)] = &[
    (
        RuleKind::Error,
        r"^(?:Error:.+|.+     Data Error?|Sub items Errors:.+)",
    ),
    (RuleKind::Compressing, r"^Compressing\s+(.+)"),
    (RuleKind::Extracting, r"^- (.+)"),
    (
        RuleKind::ListField,
        r"^(Solid|Path|Size|CRC|Attributes|Method) = (.*)$",
    ),
];

static COMPILED_RULES: LazyLock<Vec<(RuleKind, Regex)>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(kind, pattern)| (*kind, Regex::new(pattern).expect("valid line rule regex")))
        .collect()
});

/// Table-driven classifier for the archive tool's console output.
pub struct LineClassifier {
    operation: OperationKind,
    rules: Vec<&'static (RuleKind, Regex)>,
}

impl LineClassifier {
    pub fn new(operation: OperationKind) -> Self {
        let rules = COMPILED_RULES
            .iter()
            .filter(|(kind, _)| kind.applies_to(operation))
            .collect();

        Self { operation, rules }
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Classifies one decoded line. Trailing line terminators are ignored.
    pub fn classify(&self, line: &str) -> LineKind {
        let line = line.trim_end_matches(['\r', '\n']);

        for (kind, regex) in self.rules.iter().copied() {
            let Some(captures) = regex.captures(line) else {
                continue;
            };
            let group = |i: usize| captures.get(i).map_or("", |m| m.as_str());

            return match kind {
                RuleKind::Error => LineKind::Error,
                RuleKind::Compressing => LineKind::Compressing(group(1).trim().to_string()),
                RuleKind::Extracting => LineKind::Extracting(group(1).trim().to_string()),
                RuleKind::ListField => match ListField::from_name(group(1)) {
                    Some(field) => LineKind::ListField {
                        field,
                        value: group(2).to_string(),
                    },
                    None => LineKind::Ignored,
                },
            };
        }

        LineKind::Ignored
    }
}
