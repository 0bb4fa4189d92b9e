use async_trait::async_trait;
use resourcery_channel::{StepInvocation, StepKind};
use resourcery_core::naming::label;
use resourcery_core::{FieldSpec, FieldType, Result, StepResult};
use resourcery_mutate::Mutation;
use resourcery_rules::{DisplayGroup, display_group};

use crate::artifact::{check_entity, check_fields, display, mutate, require};
use crate::executor::{StepEnv, StepExecutor};

const VIEW_RECORD_IMPORT: &str = "Filament\\Resources\\Pages\\ViewRecord";
const INFOLIST_IMPORTS: [&str; 4] = [
    "Filament\\Infolists\\Infolist",
    "Filament\\Infolists\\Components\\TextEntry",
    "Filament\\Infolists\\Components\\Section",
    "Filament\\Infolists\\Components\\Grid",
];

/// `generate-view-page`: adds a sectioned read-only infolist to an existing
/// record view page.
#[derive(Debug, Default)]
pub struct ViewPageStep;

#[async_trait]
impl StepExecutor for ViewPageStep {
    fn kind(&self) -> StepKind {
        StepKind::ViewPage
    }

    async fn execute(&self, env: &StepEnv, invocation: &StepInvocation) -> Result<StepResult> {
        check_entity(&invocation.entity)?;
        check_fields(&invocation.fields)?;
        let path = env.layout.view_page_path(&invocation.entity);
        require(&path, "View page file does not exist").await?;

        let mut mutations = Vec::new();
        let mut after = VIEW_RECORD_IMPORT;
        for import in INFOLIST_IMPORTS {
            mutations.push(Mutation::ensure_import(import, Some(after)));
            after = import;
        }
        mutations.push(Mutation::append_to_class(infolist_method(&invocation.fields)));
        mutate(&path, "view page", &mutations).await?;

        tracing::info!(event = "view_page_modified", entity = %invocation.entity);
        Ok(StepResult::success("View page modified successfully").with("viewPagePath", display(&path)))
    }
}

fn infolist_method(fields: &[FieldSpec]) -> String {
    format!(
        "\n\n    public function infolist(Infolist $infolist): Infolist\n    {{\n        return $infolist\n            ->schema([\n{}\n            ]);\n    }}",
        infolist_schema(fields)
    )
}

/// Sections in fixed order: basic (with booleans), content, numeric, dates,
/// structured, then metadata. Empty sections are omitted; metadata is always
/// present.
pub fn infolist_schema(fields: &[FieldSpec]) -> String {
    let in_group = |group: DisplayGroup| -> Vec<&FieldSpec> {
        fields
            .iter()
            .filter(|field| display_group(field) == Some(group))
            .collect()
    };

    let mut sections = Vec::new();

    let basic = in_group(DisplayGroup::Basic);
    let boolean = in_group(DisplayGroup::Boolean);
    if !basic.is_empty() || !boolean.is_empty() {
        let entries = basic
            .iter()
            .map(|field| basic_entry(field))
            .chain(boolean.iter().map(|field| boolean_entry(field)))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(grid_section(
            "Basic Information",
            "heroicon-o-information-circle",
            "Core details and information",
            2,
            &entries,
            false,
        ));
    }

    let content = in_group(DisplayGroup::Content);
    if !content.is_empty() {
        let entries = join_entries(&content, content_entry);
        sections.push(section(
            "Content",
            "heroicon-o-document-text",
            "Text and content fields",
            &entries,
            false,
        ));
    }

    let numeric = in_group(DisplayGroup::Numeric);
    if !numeric.is_empty() {
        let entries = join_entries(&numeric, numeric_entry);
        sections.push(grid_section(
            "Numeric Data",
            "heroicon-o-calculator",
            "Numerical values and metrics",
            3,
            &entries,
            false,
        ));
    }

    let dates = in_group(DisplayGroup::Dates);
    if !dates.is_empty() {
        let entries = join_entries(&dates, date_entry);
        sections.push(grid_section(
            "Dates & Times",
            "heroicon-o-calendar",
            "Date and time information",
            2,
            &entries,
            false,
        ));
    }

    let structured = in_group(DisplayGroup::Structured);
    if !structured.is_empty() {
        let entries = join_entries(&structured, json_entry);
        sections.push(section(
            "JSON Data",
            "heroicon-o-code-bracket",
            "Structured data and JSON fields",
            &entries,
            true,
        ));
    }

    sections.push(METADATA_SECTION.to_string());
    sections.join("\n")
}

fn join_entries(fields: &[&FieldSpec], entry: fn(&FieldSpec) -> String) -> String {
    fields
        .iter()
        .map(|field| entry(field))
        .collect::<Vec<_>>()
        .join("\n")
}

fn entry_head(field: &FieldSpec) -> String {
    format!(
        "                        TextEntry::make('{}')\n                            ->label('{}')\n",
        field.name,
        label(&field.name)
    )
}

fn chain(line: &str) -> String {
    format!("                            ->{line}\n")
}

fn basic_entry(field: &FieldSpec) -> String {
    let mut entry = entry_head(field);
    entry.push_str(&chain("copyable()"));
    if field.nullable {
        entry.push_str(&chain("placeholder('N/A')"));
    }
    entry.push_str("                            ->icon('heroicon-m-document-text'),");
    entry
}

fn boolean_entry(field: &FieldSpec) -> String {
    let mut entry = entry_head(field);
    entry.push_str(&chain("badge()"));
    entry.push_str(&chain(
        "color(fn ($state): string => $state ? 'success' : 'danger')",
    ));
    entry.push_str(&chain(
        "formatStateUsing(fn ($state): string => $state ? 'Yes' : 'No')",
    ));
    entry.push_str(
        "                            ->icon(fn ($state): string => $state ? 'heroicon-m-check-circle' : 'heroicon-m-x-circle'),",
    );
    entry
}

fn content_entry(field: &FieldSpec) -> String {
    let mut entry = entry_head(field);
    for line in ["markdown()", "prose()", "columnSpanFull()"] {
        entry.push_str(&chain(line));
    }
    if field.nullable {
        entry.push_str(&chain("placeholder('No content available')"));
    }
    entry.push_str("                            ->icon('heroicon-m-document-text'),");
    entry
}

fn numeric_entry(field: &FieldSpec) -> String {
    let mut entry = entry_head(field);
    if field.field_type.is_decimal() {
        for line in ["numeric(2)", "badge()", "color('info')"] {
            entry.push_str(&chain(line));
        }
    } else {
        entry.push_str(&chain("numeric()"));
    }
    if field.nullable {
        entry.push_str(&chain("placeholder('0')"));
    }
    entry.push_str("                            ->icon('heroicon-m-hashtag'),");
    entry
}

fn date_entry(field: &FieldSpec) -> String {
    let mut entry = entry_head(field);
    if field.field_type == FieldType::Date {
        entry.push_str(&chain("date('M d, Y')"));
    } else {
        entry.push_str(&chain("dateTime('M d, Y H:i')"));
    }
    entry.push_str(&chain("badge()"));
    entry.push_str(&chain("color('primary')"));
    if field.nullable {
        entry.push_str(&chain("placeholder('Not set')"));
    }
    entry.push_str("                            ->icon('heroicon-m-calendar'),");
    entry
}

fn json_entry(field: &FieldSpec) -> String {
    let mut entry = entry_head(field);
    entry.push_str(&chain(
        "formatStateUsing(fn ($state): string => $state ? json_encode($state, JSON_PRETTY_PRINT | JSON_UNESCAPED_SLASHES) : 'N/A')",
    ));
    entry.push_str(&chain("columnSpanFull()"));
    entry.push_str(&chain("copyable()"));
    if field.nullable {
        entry.push_str(&chain("placeholder('No data')"));
    }
    entry.push_str("                            ->icon('heroicon-m-code-bracket'),");
    entry
}

fn grid_section(
    title: &str,
    icon: &str,
    description: &str,
    columns: u8,
    entries: &str,
    collapsed: bool,
) -> String {
    let body = format!(
        "                        Grid::make({columns})\n                            ->schema([\n{entries}\n                            ]),"
    );
    section(title, icon, description, &body, collapsed)
}

fn section(title: &str, icon: &str, description: &str, body: &str, collapsed: bool) -> String {
    let tail = if collapsed {
        "                    ->collapsible()\n                    ->collapsed(),"
    } else {
        "                    ->collapsible(),"
    };
    format!(
        "                Section::make('{title}')\n                    ->icon('{icon}')\n                    ->description('{description}')\n                    ->schema([\n{body}\n                    ])\n{tail}"
    )
}

const METADATA_SECTION: &str = r#"                Section::make('Metadata')
                    ->icon('heroicon-o-clock')
                    ->description('Record tracking information')
                    ->schema([
                        Grid::make(3)
                            ->schema([
                                TextEntry::make('created_at')
                                    ->label('Created At')
                                    ->dateTime('M d, Y H:i')
                                    ->badge()
                                    ->icon('heroicon-m-plus-circle')
                                    ->color('success'),
                                TextEntry::make('updated_at')
                                    ->label('Updated At')
                                    ->dateTime('M d, Y H:i')
                                    ->badge()
                                    ->since()
                                    ->icon('heroicon-m-arrow-path')
                                    ->color('warning'),
                                TextEntry::make('deleted_at')
                                    ->label('Deleted At')
                                    ->dateTime('M d, Y H:i')
                                    ->badge()
                                    ->icon('heroicon-m-trash')
                                    ->color('danger')
                                    ->placeholder('Active')
                                    ->visible(fn ($record) => $record->deleted_at !== null),
                            ]),
                    ])
                    ->collapsible()
                    ->collapsed(),"#;
