//! Shared schema fixtures.

#![allow(dead_code)]

use vmdir_schema::{LdapSchema, SchemaDefinitions};

pub const DIRECTORY_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.15";
pub const OID_SYNTAX: &str = "1.3.6.1.4.1.1466.115.121.1.38";
pub const INTEGER: &str = "1.3.6.1.4.1.1466.115.121.1.27";

/// A small but complete schema: `top`, `person`, an auxiliary class and a
/// content rule tying them together.
pub fn base_definitions() -> SchemaDefinitions {
    SchemaDefinitions {
        attribute_types: vec![
            format!("( 2.5.4.0 NAME 'objectClass' SYNTAX {OID_SYNTAX} )"),
            format!("( 2.5.4.41 NAME 'name' SYNTAX {DIRECTORY_STRING}{{32768}} )"),
            "( 2.5.4.3 NAME ( 'cn' 'commonName' ) DESC 'common name' SUP name )".to_string(),
            "( 2.5.4.4 NAME ( 'sn' 'surname' ) SUP name )".to_string(),
            format!("( 2.5.4.13 NAME 'description' SYNTAX {DIRECTORY_STRING} )"),
            format!("( 0.9.2342.19200300.100.1.3 NAME 'mail' SYNTAX {DIRECTORY_STRING} )"),
            format!("( 1.2.840.113556.1.4.221 NAME 'sAMAccountName' SYNTAX {DIRECTORY_STRING} SINGLE-VALUE )"),
            format!("( 9.9.9.1 NAME 'employeeNumber' SYNTAX {INTEGER} SINGLE-VALUE )"),
        ],
        object_classes: vec![
            "( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )".to_string(),
            "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( cn $ sn ) MAY description )"
                .to_string(),
            "( 9.9.9.2 NAME 'mailRecipient' SUP top AUXILIARY MAY mail )".to_string(),
        ],
        content_rules: vec![
            "( 2.5.6.6 NAME 'person' AUX mailRecipient MAY sAMAccountName )".to_string(),
        ],
        ..Default::default()
    }
}

pub fn base_schema() -> LdapSchema {
    let mut schema = LdapSchema::new();
    schema
        .load_definitions(&base_definitions())
        .expect("base schema loads");
    schema
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
