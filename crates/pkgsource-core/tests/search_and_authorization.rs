//! Store searches, authorization properties and concurrent access.

use std::sync::Arc;
use std::thread;

use pkgsource_core::{
    Decision, ManifestStore, MatchType, PackageMatchField, PackageRule, Rule, Ruleset,
    SearchPredicate,
};
use pkgsource_schema::manifest::v1_1;
use pkgsource_schema::{Locale, PackageVersionRecord, SchemaVersion, VersionData, VersionView};

fn record(id: &str, version: &str, name: &str, description: &str, tags: &[&str]) -> PackageVersionRecord {
    PackageVersionRecord::V1_1(VersionData {
        package_identifier: id.to_string(),
        schema_version: SchemaVersion::V1_1_0,
        package_version: version.to_string(),
        channel: None,
        default_locale: Locale {
            package_locale: "en-US".to_string(),
            fields: v1_1::LocaleFields {
                package_name: name.to_string(),
                short_description: description.to_string(),
                tags: tags.iter().map(ToString::to_string).collect(),
                ..Default::default()
            },
        },
        locales: Vec::new(),
        installers: Vec::new(),
    })
}

fn sample_store() -> ManifestStore {
    let store = ManifestStore::new();
    store.set(
        "git.install",
        "2.45.0",
        record("git.install", "2.45.0", "Git", "Distributed version control", &["vcs"]),
    );
    store.set(
        "git.install",
        "2.46.0",
        record("git.install", "2.46.0", "Git", "Distributed version control", &["vcs"]),
    );
    store.set(
        "Vim.Vim",
        "9.1",
        record("Vim.Vim", "9.1", "Vim", "The ubiquitous text editor", &["editor"]),
    );
    store.set(
        "JetBrains.IntelliJ",
        "2024.1",
        record("JetBrains.IntelliJ", "2024.1", "IntelliJ IDEA", "Java IDE", &["ide", "java"]),
    );
    store.set(
        "Contoso.Tool",
        "1.0",
        record("Contoso.Tool", "1.0", "Tool", "Does things", &["misc"]),
    );
    store
}

fn groups(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

fn sorted_keys(map: &pkgsource_core::PackageMap) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

#[test]
fn test_keyword_search_is_case_insensitive_on_name_and_description() {
    let store = sample_store();

    let result = store.get_by_keyword("EDITOR");
    assert_eq!(sorted_keys(&result), vec!["Vim.Vim"]);

    let result = store.get_by_keyword("git");
    assert_eq!(sorted_keys(&result), vec!["git.install"]);
    assert_eq!(result["git.install"].len(), 2);

    assert!(store.get_by_keyword("nothing-matches").is_empty());
}

#[test]
fn test_identifier_exact_filter() {
    let store = sample_store();
    let filter = SearchPredicate::new(
        PackageMatchField::PackageIdentifier,
        MatchType::Exact,
        "git.install",
    );
    let result = store.get_by_match_filter(&[], &[filter]);
    assert_eq!(sorted_keys(&result), vec!["git.install"]);
    for record in &result["git.install"] {
        assert_eq!(record.package_identifier(), "git.install");
    }
}

#[test]
fn test_tag_inclusions_are_a_union() {
    let store = sample_store();
    let inclusions = [
        SearchPredicate::new(PackageMatchField::Tag, MatchType::Substring, "editor"),
        SearchPredicate::new(PackageMatchField::Tag, MatchType::Substring, "ide"),
    ];
    let result = store.get_by_match_filter(&inclusions, &[]);
    assert_eq!(sorted_keys(&result), vec!["JetBrains.IntelliJ", "Vim.Vim"]);
}

#[test]
fn test_unimplemented_match_types_never_match() {
    let store = sample_store();
    for match_type in [MatchType::Wildcard, MatchType::Fuzzy, MatchType::FuzzySubstring] {
        let filter = SearchPredicate::new(PackageMatchField::PackageName, match_type, "Vim");
        assert!(store.get_by_match_filter(&[], &[filter]).is_empty());
    }
}

#[test]
fn test_starts_with_is_case_sensitive_but_substring_is_not() {
    let store = sample_store();
    let starts = |k: &str| {
        store.get_by_match_filter(
            &[],
            &[SearchPredicate::new(PackageMatchField::PackageName, MatchType::StartsWith, k)],
        )
    };
    assert_eq!(sorted_keys(&starts("Intelli")), vec!["JetBrains.IntelliJ"]);
    assert!(starts("intelli").is_empty());

    let substring = SearchPredicate::new(PackageMatchField::PackageName, MatchType::Substring, "IDEA");
    let result = store.get_by_match_filter(&[], &[substring]);
    assert_eq!(sorted_keys(&result), vec!["JetBrains.IntelliJ"]);
}

#[test]
fn test_global_deny_all_is_irrevocable() {
    let ruleset = Ruleset {
        global: Rule::deny_all(),
        packages: vec![PackageRule {
            package_identifier: "Vim.Vim".to_string(),
            package_version: None,
            rule: Rule::allow_all(),
        }],
        default: Rule::allow_all(),
    };

    for caller in [groups(&[]), groups(&["admins", "dev"])] {
        let decision = ruleset.evaluate_global_rule(&caller);
        assert_eq!(decision, Decision::Denied);
        assert!(!ruleset.filter_authorized_package(decision, "Vim.Vim", &caller));
        assert!(!ruleset.filter_authorized_package(decision, "Other", &caller));
    }
}

#[test]
fn test_later_package_deny_beats_earlier_allow() {
    let ruleset = Ruleset {
        global: Rule::default(),
        packages: vec![
            PackageRule {
                package_identifier: "Contoso.Tool".to_string(),
                package_version: None,
                rule: Rule {
                    allow: groups(&["dev"]),
                    ..Rule::default()
                },
            },
            PackageRule {
                package_identifier: "Contoso.Tool".to_string(),
                package_version: None,
                rule: Rule {
                    deny: groups(&["contractors"]),
                    ..Rule::default()
                },
            },
        ],
        default: Rule::allow_all(),
    };

    let caller = groups(&["dev", "contractors"]);
    let decision = ruleset.evaluate_global_rule(&caller);
    assert_eq!(decision, Decision::Unchanged);
    assert!(!ruleset.filter_authorized_package(decision, "Contoso.Tool", &caller));
    assert!(ruleset.is_package_visible("Contoso.Tool", &groups(&["dev"])));
}

#[test]
fn test_default_allow_all_shows_every_unruled_package() {
    let store = sample_store();
    let ruleset = Ruleset::allow_all();
    let caller = groups(&["anyone"]);
    let decision = ruleset.evaluate_global_rule(&caller);
    for id in store.get_all_package_identifiers() {
        assert!(ruleset.filter_authorized_package(decision, &id, &caller));
    }
}

#[test]
fn test_concurrent_set_and_get() {
    let store = Arc::new(ManifestStore::new());

    let writers: Vec<_> = (0..8)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("Pkg.{w}");
                    let version = format!("{i}.0");
                    store.set(&id, &version, record(&id, &version, "Pkg", "", &[]));
                    let got = store.get(&id, &version).expect("just written");
                    assert_eq!(got.package_version(), version);
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..50 {
                    for (id, records) in store.get_all() {
                        for record in records {
                            assert_eq!(record.package_identifier(), id);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(store.package_count(), 8);
    assert_eq!(store.len(), 400);
}

#[test]
fn test_concurrent_replacement_keeps_one_record() {
    let store = Arc::new(ManifestStore::new());
    let handles: Vec<_> = (0..8)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let name = format!("writer-{w}");
                store.set("Foo.Bar", "1.0.0", record("Foo.Bar", "1.0.0", &name, "", &[]));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 1);
    let record = store.get("Foo.Bar", "1.0.0").unwrap();
    assert!(record.package_name().starts_with("writer-"));
}
