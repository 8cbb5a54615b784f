// Stylesheets for the four templates plus the preview/export page rules.
// Templates restyle the shared markup; they never reorder it.

pub const BASE_CSS: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
  line-height: 1.6;
  color: #333;
  padding: 40px;
}
h1.name { font-size: 32px; margin-bottom: 4px; }
h2.headline { font-size: 18px; font-weight: normal; color: #64748b; margin-bottom: 16px; }
.contact { color: #64748b; font-size: 14px; margin-bottom: 8px; }
section { margin-bottom: 24px; }
section h3 { font-size: 16px; margin-bottom: 10px; padding-bottom: 4px; }
.entry { margin-bottom: 12px; }
.entry-title { font-weight: 600; }
.entry-meta { font-size: 14px; color: #64748b; }
.entry-desc { margin-top: 4px; }
.skill-list { display: flex; flex-wrap: wrap; gap: 8px; }
.skill { padding: 3px 10px; border-radius: 999px; background: #f1f5f9; font-size: 14px; }
pre.freeform {
  font-family: inherit;
  white-space: pre-wrap;
  word-break: break-word;
}
"#;

/// Single column with a colored banner (default).
pub const MODERNE_CSS: &str = r#"
.cv--moderne .identity {
  background: #2563eb;
  color: #fff;
  padding: 28px 32px;
  margin: -40px -40px 28px -40px;
}
.cv--moderne .identity h2.headline,
.cv--moderne .identity .contact { color: #dbeafe; }
.cv--moderne section h3 { color: #2563eb; border-bottom: 2px solid #2563eb; }
.cv--moderne .skill { background: #dbeafe; color: #1e40af; }
"#;

/// Two-column layout: identity block as a tinted sidebar.
pub const CLASSIQUE_CSS: &str = r#"
.cv--classique {
  display: grid;
  grid-template-columns: 64mm 1fr;
  column-gap: 28px;
}
.cv--classique .identity {
  grid-column: 1;
  grid-row: 1 / span 6;
  background: #f8fafc;
  border-right: 1px solid #e2e8f0;
  padding: 20px;
}
.cv--classique .identity .contact { display: block; margin-top: 12px; }
.cv--classique section { grid-column: 2; }
.cv--classique section h3 {
  color: #0f172a;
  border-bottom: 1px solid #0f172a;
  text-transform: uppercase;
  letter-spacing: 1px;
  font-size: 14px;
}
"#;

/// Colored card sections.
pub const CREATIF_CSS: &str = r#"
.cv--creatif section {
  border-radius: 12px;
  padding: 18px 20px;
}
.cv--creatif .summary { background: #fef3c7; }
.cv--creatif .experience { background: #e0f2fe; }
.cv--creatif .education { background: #dcfce7; }
.cv--creatif .skills { background: #fae8ff; }
.cv--creatif .languages { background: #ffe4e6; }
.cv--creatif section h3 { color: #7c3aed; border-bottom: none; }
.cv--creatif h1.name { color: #7c3aed; }
"#;

/// Monospace, code-styled sections.
pub const TECH_CSS: &str = r#"
.cv--tech {
  font-family: 'JetBrains Mono', 'Fira Code', Consolas, monospace;
  background: #0f172a;
  color: #e2e8f0;
}
.cv--tech h2.headline, .cv--tech .contact, .cv--tech .entry-meta { color: #94a3b8; }
.cv--tech section {
  border: 1px solid #334155;
  border-radius: 6px;
  padding: 14px 16px;
}
.cv--tech section h3 { color: #22d3ee; border-bottom: 1px dashed #334155; }
.cv--tech section h3::before { content: "// "; }
.cv--tech .skill { background: #1e293b; color: #22d3ee; }
"#;

/// On-screen preview: responsive width, screen shadows.
pub const PREVIEW_CSS: &str = r#"
body.cv--preview { max-width: 820px; margin: 0 auto; }
"#;

/// Static export: fixed A4 page geometry, print rules, no runtime affordances.
pub const EXPORT_CSS: &str = r#"
@page { size: A4; margin: 0; }
body.cv--export { width: 210mm; min-height: 297mm; margin: 0 auto; }
@media print {
  body.cv--export { padding: 15mm; }
  section { break-inside: avoid; }
}
"#;
