// changelog document tree and reStructuredText output

use super::aggregate::CollapsedEntry;
use super::config::ChangelogConfig;
use crate::utils::fragment::SectionContent;
use crate::utils::galaxy::title_case;
use crate::utils::plugins::{MODULE_TYPE, PluginEntry, PluginResolver};
use std::collections::BTreeMap;

/// heading underline characters, by nesting depth
const UNDERLINES: &[char] = &[
    '=', '-', '~', '^', '.', '*', '+', ':', '`', '\'', '"', '_', '#',
];

/// a titled section with body lines and nested subsections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSection {
    pub title: String,
    pub lines: Vec<String>,
    pub subsections: Vec<DocumentSection>,
}

impl DocumentSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// existing subsection with this title, or a new one appended at the end
    pub fn child_mut(&mut self, title: &str) -> &mut DocumentSection {
        let index = match self.subsections.iter().position(|s| s.title == title) {
            Some(index) => index,
            None => {
                self.subsections.push(DocumentSection::new(title));
                self.subsections.len() - 1
            }
        };
        &mut self.subsections[index]
    }

    pub fn child(&self, title: &str) -> Option<&DocumentSection> {
        self.subsections.iter().find(|s| s.title == title)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.subsections.iter().all(|s| s.is_empty())
    }

    fn write_rst(&self, depth: usize, out: &mut Vec<String>) {
        let underline = UNDERLINES[depth.min(UNDERLINES.len() - 1)];
        out.push(self.title.clone());
        out.push(underline.to_string().repeat(self.title.chars().count()));
        out.push(String::new());

        if !self.lines.is_empty() {
            out.extend(self.lines.iter().cloned());
            out.push(String::new());
        }

        for section in &self.subsections {
            section.write_rst(depth + 1, out);
        }
    }
}

/// a full changelog: title, preamble and one section per release entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub preamble: Vec<String>,
    pub sections: Vec<DocumentSection>,
}

impl Document {
    pub fn to_rst(&self) -> String {
        let rule = "=".repeat(self.title.chars().count());
        let mut out = vec![rule.clone(), self.title.clone(), rule, String::new()];

        if !self.preamble.is_empty() {
            out.extend(self.preamble.iter().cloned());
            out.push(String::new());
        }

        for section in &self.sections {
            section.write_rst(0, &mut out);
        }

        let mut text = out.join("\n");
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text
    }
}

/// builds the document tree from collapsed release entries
pub struct ChangelogRenderer<'a> {
    config: &'a ChangelogConfig,
    resolver: &'a dyn PluginResolver,
    flatmap: bool,
}

impl<'a> ChangelogRenderer<'a> {
    pub fn new(config: &'a ChangelogConfig, resolver: &'a dyn PluginResolver) -> Self {
        Self {
            config,
            resolver,
            flatmap: false,
        }
    }

    /// list modules by short name instead of `namespace.name`
    pub fn flatmap(mut self, flatmap: bool) -> Self {
        self.flatmap = flatmap;
        self
    }

    pub fn document_title(&self, latest_version: &str, codename: Option<&str>) -> String {
        let title = self.config.title.as_deref().unwrap_or("Project");
        let prefix = crate::utils::version::version_prefix(
            latest_version,
            self.config.changelog_filename_version_depth,
        );
        match codename {
            Some(codename) => format!("{} {} \"{}\" Release Notes", title, prefix, codename),
            None => format!("{} {} Release Notes", title, prefix),
        }
    }

    pub fn render(
        &self,
        entries: &[CollapsedEntry],
        latest_version: &str,
        codename: Option<&str>,
    ) -> Document {
        Document {
            title: self.document_title(latest_version, codename),
            preamble: vec![".. contents:: Topics".to_string()],
            sections: entries.iter().map(|e| self.release_section(e)).collect(),
        }
    }

    fn release_section(&self, entry: &CollapsedEntry) -> DocumentSection {
        let mut section = DocumentSection::new(format!("v{}", entry.version));
        let mut plugins_placed = false;

        for (key, title) in self.config.ordered_sections() {
            if let Some(content) = entry.changes.get(key)
                && let Some(rendered) = change_section(title, content)
            {
                section.subsections.push(rendered);
            }

            if !self.config.new_plugins_after_name.is_empty()
                && key == self.config.new_plugins_after_name
            {
                self.push_plugin_sections(entry, &mut section);
                plugins_placed = true;
            }
        }

        if !plugins_placed {
            self.push_plugin_sections(entry, &mut section);
        }
        section
    }

    fn push_plugin_sections(&self, entry: &CollapsedEntry, section: &mut DocumentSection) {
        section.subsections.extend(self.plugins_section(&entry.plugins));
        section.subsections.extend(self.modules_section(&entry.modules));
    }

    fn plugins_section(&self, plugins: &BTreeMap<String, Vec<String>>) -> Option<DocumentSection> {
        let mut section = DocumentSection::new("New Plugins");

        for (plugin_type, names) in plugins {
            if plugin_type == MODULE_TYPE {
                continue;
            }
            let mut resolved = self.resolver.resolve(plugin_type, names);
            if resolved.is_empty() {
                continue;
            }
            resolved.sort_by(|a, b| a.name.cmp(&b.name));
            resolved.dedup_by(|a, b| a.name == b.name);

            let child = section.child_mut(&title_case(plugin_type));
            for plugin in &resolved {
                child.line(format!("- {} - {}", plugin.name, plugin.description));
            }
        }

        (!section.subsections.is_empty()).then_some(section)
    }

    fn modules_section(&self, names: &[String]) -> Option<DocumentSection> {
        let resolved = self.resolver.resolve(MODULE_TYPE, names);
        if resolved.is_empty() {
            return None;
        }

        let mut by_namespace: BTreeMap<String, BTreeMap<String, PluginEntry>> = BTreeMap::new();
        for module in resolved {
            by_namespace
                .entry(module.namespace.clone().unwrap_or_default())
                .or_default()
                .insert(module.name.clone(), module);
        }

        let mut section = DocumentSection::new("New Modules");
        for (namespace, modules) in &by_namespace {
            let (top, rest) = match namespace.split_once('.') {
                Some((top, rest)) => (top, rest),
                None => (namespace.as_str(), ""),
            };

            let mut target = &mut section;
            if !top.is_empty() {
                target = target.child_mut(&title_case(&top.replace('_', " ")));
            }
            if !rest.is_empty() {
                target = target.child_mut(rest);
            }

            for module in modules.values() {
                let name = if self.flatmap || namespace.is_empty() {
                    module.name.clone()
                } else {
                    format!("{}.{}", namespace, module.name)
                };
                target.line(format!("- {} - {}", name, module.description));
            }
        }

        Some(section)
    }
}

fn change_section(title: &str, content: &SectionContent) -> Option<DocumentSection> {
    let mut section = DocumentSection::new(title);
    match content {
        SectionContent::Text(text) => {
            let text = text.trim_end();
            if text.is_empty() {
                return None;
            }
            section.lines.extend(text.lines().map(str::to_string));
        }
        SectionContent::Items(items) => {
            if items.is_empty() {
                return None;
            }
            let mut items: Vec<&String> = items.iter().collect();
            items.sort();
            for item in items {
                section.line(bullet(item));
            }
        }
    }
    Some(section)
}

/// `- text`, with continuation lines indented under the bullet
fn bullet(text: &str) -> String {
    let mut lines = text.trim_end().lines();
    let mut out = format!("- {}", lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str("  ");
            out.push_str(line);
        }
    }
    out
}
