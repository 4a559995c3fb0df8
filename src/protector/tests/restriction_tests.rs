//! Restriction context tests
//!
//! Rules that inspect related restricted objects must not re-trigger their
//! own defensive checks; these tests drive that through the public API.

use protector::restriction::insecure;
use protector::{
    run_insecurely, Conditions, FieldValues, Protected, ProtectorConfig, ProtectorError,
    Restriction, RuleSet,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
struct Viewer {
    name: String,
}

#[derive(Debug)]
struct Folder {
    owner: String,
    restriction: Restriction<Option<Viewer>>,
}

impl Protected for Folder {
    type Actor = Option<Viewer>;

    fn restriction(&self) -> &Restriction<Self::Actor> {
        &self.restriction
    }

    fn restriction_mut(&mut self) -> &mut Restriction<Self::Actor> {
        &mut self.restriction
    }
}

fn folder(owner: &str) -> Folder {
    Folder {
        owner: owner.to_string(),
        restriction: Restriction::new(),
    }
}

fn viewer(name: &str) -> Option<Viewer> {
    Some(Viewer {
        name: name.to_string(),
    })
}

fn folder_rules() -> RuleSet<Option<Viewer>, Folder> {
    let mut rules: RuleSet<Option<Viewer>, Folder> =
        RuleSet::with_fields(["name", "owner", "shared"]).with_config(ProtectorConfig::default());
    rules.protect(|dsl, viewer: &Option<Viewer>, folder: &Folder| {
        match viewer {
            Some(viewer) if viewer.name == folder.owner => {
                dsl.can_all("read")?.can_all("update")?.can_all("destroy")?;
            }
            Some(_) => {
                dsl.can("read", ["name"])?;
            }
            None => {}
        }

        // Defensive grants only apply while the folder is actively restricted
        if folder.is_actively_restricted() {
            dsl.can_with(
                "update",
                Vec::<String>::new(),
                Conditions::new().equals("shared", false),
            )?;
        } else {
            dsl.can("update", ["shared"])?;
        }
        Ok(())
    });
    rules
}

// ============================================================================
// SUBJECT TESTS
// ============================================================================

#[test]
fn test_unrestricted_subject_fails() {
    let folder = folder("alice");
    let err = folder.subject().unwrap_err();
    assert!(matches!(err, ProtectorError::Unrestricted));
    assert!(folder.boundary(&folder_rules()).unwrap_err().is_unrestricted());
}

#[test]
fn test_null_subject_is_restricted() {
    let folder = folder("alice").restricted_to(None);

    assert!(folder.is_restricted());
    assert!(folder.is_actively_restricted());
    assert_eq!(folder.subject().unwrap(), &None);

    let boundary = folder.boundary(&folder_rules()).unwrap();
    assert!(!boundary.can("read"));
    assert!(!boundary.destroyable());
}

#[test]
fn test_restrict_then_unrestrict() {
    let mut folder = folder("alice");
    folder.restrict(viewer("bob"));
    assert_eq!(folder.subject().unwrap(), &viewer("bob"));

    folder.unrestrict();
    assert!(!folder.is_restricted());
    assert!(folder.subject().is_err());
}

// ============================================================================
// INSECURE MODE TESTS
// ============================================================================

#[test]
fn test_owner_gets_everything() {
    let folder = folder("alice").restricted_to(viewer("alice"));
    let boundary = folder.boundary(&folder_rules()).unwrap();

    assert!(boundary.destroyable());

    let mut change = FieldValues::new();
    change.insert("name".to_string(), json!("archive"));
    assert!(boundary.updatable_with(&change));

    // The defensive condition replaces the owner's unconditional grant
    change.insert("shared".to_string(), json!(true));
    assert!(!boundary.updatable_with(&change));
    assert_eq!(boundary.first_unupdatable_field(&change), Some("shared"));
}

#[test]
fn test_active_restriction_drives_conditions() {
    let folder = folder("alice").restricted_to(viewer("bob"));
    let rules = folder_rules();

    let secure = folder.boundary(&rules).unwrap();
    let shared = json!(true);
    assert!(!secure.updatable_with([("shared", &shared)]));

    let relaxed = run_insecurely(|| folder.boundary(&rules)).unwrap();
    assert!(relaxed.updatable_with([("shared", &shared)]));
    assert!(folder.is_actively_restricted());
}

#[test]
fn test_nested_insecure_blocks_release_in_order() {
    let folder = folder("alice").restricted_to(viewer("carol"));

    run_insecurely(|| {
        assert!(!folder.is_actively_restricted());
        run_insecurely(|| {
            assert_eq!(insecure::depth(), 2);
            assert!(!folder.is_actively_restricted());
        });
        assert_eq!(insecure::depth(), 1);
        assert!(!folder.is_actively_restricted());
    });

    assert!(folder.is_actively_restricted());
    assert!(folder.is_restricted());
}

#[test]
fn test_subject_survives_insecure_mode() {
    let folder = folder("alice").restricted_to(viewer("dave"));
    let subject = run_insecurely(|| folder.subject().cloned());
    assert_eq!(subject.unwrap(), viewer("dave"));
}

#[test]
fn test_predicate_does_not_leak_insecure_mode() {
    let folder = folder("alice").restricted_to(viewer("erin"));
    let mut rules: RuleSet<Option<Viewer>, Folder> =
        RuleSet::with_fields(["name"]).with_config(ProtectorConfig::default());
    rules.protect_all(|dsl| {
        dsl.can_with(
            "update",
            Vec::<String>::new(),
            Conditions::new().predicate("name", |_| insecure::is_insecure()),
        )?;
        Ok(())
    });

    let boundary = folder.boundary(&rules).unwrap();
    let name = json!("renamed");
    assert!(boundary.updatable_with([("name", &name)]));
    assert!(!insecure::is_insecure());
    assert!(folder.is_actively_restricted());
}
