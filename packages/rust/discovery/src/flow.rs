//! Managed-flow detection.
//!
//! A flow shipped inside a managed package is retrieved as an empty shell:
//! the `Flow` root carries none of the element groups that hold authored
//! logic.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use orgdocs_shared::{OrgDocsError, Result};

/// Element groups whose presence means the flow has authored logic.
pub const FLOW_ELEMENT_GROUPS: [&str; 16] = [
    "start",
    "actionCalls",
    "assignments",
    "customErrors",
    "collectionProcessors",
    "decisions",
    "loops",
    "recordCreates",
    "recordDeletes",
    "recordLookups",
    "recordUpdates",
    "screens",
    "subflows",
    "variables",
    "constants",
    "formulas",
];

/// Read and inspect a `*.flow-meta.xml` file.
pub fn is_managed_flow(path: &Path) -> Result<bool> {
    let xml = std::fs::read_to_string(path).map_err(|e| OrgDocsError::io(path, e))?;
    is_managed_flow_xml(&xml).map_err(|e| match e {
        OrgDocsError::Parse { message } => {
            OrgDocsError::parse(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// `true` when none of [`FLOW_ELEMENT_GROUPS`] appears directly under the
/// `Flow` root. A document whose root is not `Flow` is treated as a shell.
pub fn is_managed_flow_xml(xml: &str) -> Result<bool> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut root_is_flow = false;
    let mut has_logic = false;

    let mut visit = |element: &BytesStart<'_>, depth: usize| {
        let name = element.local_name();
        if depth == 0 {
            saw_root = true;
            root_is_flow = name.as_ref() == b"Flow";
        } else if depth == 1 && root_is_flow && is_element_group(name.as_ref()) {
            has_logic = true;
        }
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                visit(&element, depth);
                depth += 1;
            }
            Ok(Event::Empty(element)) => visit(&element, depth),
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(OrgDocsError::parse(format!(
                    "malformed flow XML at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    if depth != 0 {
        return Err(OrgDocsError::parse("unexpected end of flow XML: unclosed element"));
    }
    if !saw_root {
        return Err(OrgDocsError::parse("flow XML has no root element"));
    }

    Ok(!(root_is_flow && has_logic))
}

fn is_element_group(name: &[u8]) -> bool {
    FLOW_ELEMENT_GROUPS.iter().any(|g| g.as_bytes() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHELL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Flow xmlns="http://soap.sforce.com/2006/04/metadata">
    <apiVersion>60.0</apiVersion>
    <label>Packaged Flow</label>
    <processType>AutoLaunchedFlow</processType>
    <status>Active</status>
</Flow>
"#;

    #[test]
    fn empty_shell_is_managed() {
        assert!(is_managed_flow_xml(SHELL).unwrap());
    }

    #[test]
    fn one_screen_makes_it_unmanaged() {
        let xml = SHELL.replace(
            "<status>Active</status>",
            "<status>Active</status>\n    <screens><name>Welcome</name></screens>",
        );
        assert!(!is_managed_flow_xml(&xml).unwrap());
    }

    #[test]
    fn every_group_counts() {
        for group in FLOW_ELEMENT_GROUPS {
            let xml = SHELL.replace("<label>", &format!("<{group}/>\n    <label>"));
            assert!(!is_managed_flow_xml(&xml).unwrap(), "{group}");
        }
    }

    #[test]
    fn nested_group_names_do_not_count() {
        let xml = SHELL.replace(
            "<label>Packaged Flow</label>",
            "<label>Packaged Flow</label>\n    <processMetadataValues><variables>x</variables></processMetadataValues>",
        );
        assert!(is_managed_flow_xml(&xml).unwrap());
    }

    #[test]
    fn prefixed_elements_use_local_name() {
        let xml = r#"<md:Flow xmlns:md="http://soap.sforce.com/2006/04/metadata"><md:decisions/></md:Flow>"#;
        assert!(!is_managed_flow_xml(xml).unwrap());
    }

    #[test]
    fn non_flow_root_is_a_shell() {
        assert!(is_managed_flow_xml("<CustomObject><screens/></CustomObject>").unwrap());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = is_managed_flow_xml("<Flow><screens></Flow>").unwrap_err();
        assert!(matches!(err, OrgDocsError::Parse { .. }));

        let err = is_managed_flow_xml("<Flow><screens>").unwrap_err();
        assert!(err.to_string().contains("unclosed"));

        assert!(is_managed_flow_xml("").is_err());
    }

    #[test]
    fn file_errors_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Broken.flow-meta.xml");
        std::fs::write(&path, "<Flow><loops></Flow>").unwrap();

        let err = is_managed_flow(&path).unwrap_err();
        assert!(err.to_string().contains("Broken.flow-meta.xml"));

        let missing = dir.path().join("Missing.flow-meta.xml");
        assert!(matches!(is_managed_flow(&missing), Err(OrgDocsError::Io { .. })));
    }
}
