//! End-to-end aggregation over a folder of text statements.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tally_core::{
    AccountTypes, Aggregator, DescriptorStore, DocumentCache, DocumentOutcome, FieldKind, Ledger,
    LedgerView, SkipReason, TallyConfig, TextExtractors, Value,
};

const BNP: &str = r#"{
    "Checking": {
        "bank-name": "BNP",
        "bank-pattern": "BNP PARIBAS",
        "account-pattern": "Compte de chèques n° (\\d+)",
        "balance-pattern": "SOLDE CREDITEUR AU \\d\\d\\.\\d\\d\\.\\d{4} ([\\d ]+),(\\d\\d)",
        "date-pattern": "SOLDE CREDITEUR AU (\\d\\d)\\.(\\d\\d)\\.(\\d{4})",
        "account-type": "checking"
    },
    "Broken": {
        "bank-name": "BNP",
        "balance-pattern": "(\\d+)",
        "operation-pattern": "(\\d+)"
    }
}"#;

const CROWD: &str = r#"{
    "Repayment": {
        "bank-name": "Crowd",
        "bank-pattern": ["CROWDLEND", "Crowd Lending SAS"],
        "account-pattern": "Projet : (\\w+)",
        "operation-pattern": "Montant : (-?\\d+),(\\d\\d)",
        "date-pattern": "Date : (\\d{4})-(\\d\\d)-(\\d\\d)",
        "date-value": "{0}-{1}-{2}",
        "account-type": "crowd-funding",
        "share": 0.5
    }
}"#;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn bnp_statement(date: &str, amount: &str) -> String {
    format!(
        "BNP PARIBAS\nCompte de chèques n° 0042\nSOLDE CREDITEUR AU {date} {amount}\n"
    )
}

fn setup() -> (tempfile::TempDir, tempfile::TempDir) {
    let confs = tempfile::tempdir().unwrap();
    write(confs.path(), "bnp.json", BNP);
    write(confs.path(), "crowd/crowd.json", CROWD);
    write(confs.path(), "broken.json", "{ nope");

    let docs = tempfile::tempdir().unwrap();
    write(docs.path(), "bnp/2019-12.txt", &bnp_statement("04.12.2019", "10,00"));
    write(docs.path(), "bnp/2021-06.txt", &bnp_statement("04.06.2021", "20,00"));
    write(docs.path(), "bnp/2022-01.txt", &bnp_statement("04.01.2022", "30,00"));
    write(docs.path(), "bnp/2022-06.txt", &bnp_statement("04.06.2022", "50,00"));
    write(
        docs.path(),
        "crowd/a.txt",
        "Crowd Lending SAS\nProjet : Solar\nMontant : 1000,00\nDate : 2020-01-15\n",
    );
    write(
        docs.path(),
        "crowd/b.txt",
        "CROWDLEND\nProjet : Solar\nMontant : -250,00\nDate : 2020-07-15\n",
    );
    write(docs.path(), "misc/letter.txt", "Dear customer,\nnothing to see here.\n");
    write(docs.path(), "misc/scan.png", "\u{89}PNG");
    (confs, docs)
}

#[test]
fn test_store_reports_rejections() {
    let (confs, _docs) = setup();
    let (store, report) = DescriptorStore::load_dir(confs.path(), "json").unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(report.loaded, 2);
    assert_eq!(report.rejected.len(), 2);
    assert!(report.rejected.iter().any(|r| r.source.ends_with("bnp.json#Broken")));
    assert!(report.rejected.iter().any(|r| r.source.ends_with("broken.json")));
}

#[test]
fn test_aggregate_folder() {
    let (confs, docs) = setup();
    let (store, _) = DescriptorStore::load_dir(confs.path(), "json").unwrap();
    let mut aggregator = Aggregator::from_config(store, &TallyConfig::default());

    let batch = aggregator.aggregate_paths(docs.path()).unwrap();

    assert_eq!(batch.documents.len(), 8);
    assert_eq!(batch.aggregated().count(), 6);
    assert!(batch.failed.is_empty());

    let mut skipped: Vec<(String, SkipReason)> = batch
        .skipped()
        .map(|(p, r)| (p.file_name().unwrap().to_string_lossy().into_owned(), r))
        .collect();
    skipped.sort();
    assert_eq!(
        skipped,
        vec![
            ("letter.txt".to_string(), SkipReason::NoDescriptor),
            ("scan.png".to_string(), SkipReason::NoText),
        ]
    );

    let ledger = &batch.ledger;
    assert_eq!(ledger.ids().collect::<Vec<_>>(), vec!["BNP-0042", "Crowd-Solar"]);

    let checking = ledger.get("BNP-0042").unwrap();
    assert_eq!(checking.balances.len(), 4);
    assert_eq!(checking.balances[&day(2021, 6, 4)], 20.0);
    assert_eq!(checking.account["account-type"], Value::Text("checking".into()));
    assert_eq!(checking.account["bank-name"], Value::Text("BNP".into()));

    let crowd = ledger.get("Crowd-Solar").unwrap();
    assert!(crowd.balances.is_empty());
    assert_eq!(crowd.operations[&day(2020, 7, 15)], -250.0);

    let types = AccountTypes::default();
    let view = LedgerView::new(ledger, &types);

    assert_eq!(view.balance_at("BNP-0042", day(2019, 1, 1), false), Some(0.0));
    assert_eq!(view.balance_at("BNP-0042", day(2021, 6, 4), false), Some(20.0));
    assert_eq!(view.balance_at("BNP-0042", day(2023, 1, 1), false), Some(50.0));
    assert_eq!(
        view.balances_at(&["Crowd-Solar", "BNP-0042"], day(2022, 6, 4), false),
        vec![375.0, 50.0]
    );
    assert_eq!(
        view.properties("Crowd-Solar").unwrap()["color"],
        Value::Text("green".into())
    );
}

#[test]
fn test_missing_fields_are_listed() {
    let (confs, docs) = setup();
    write(
        docs.path(),
        "bnp/2023-01.txt",
        "BNP PARIBAS\nCompte de chèques n° 0042\nSOLDE CREDITEUR AU 04.01.2023 -\n",
    );
    let (store, _) = DescriptorStore::load_dir(confs.path(), "json").unwrap();
    let mut aggregator = Aggregator::new(store, TextExtractors::default(), DocumentCache::new(2));

    let batch = aggregator
        .aggregate_paths(&docs.path().join("bnp").join("2023-01.txt"))
        .unwrap();

    let issues: Vec<FieldKind> = batch.issues().map(|(_, issue)| issue.field).collect();
    assert_eq!(issues, vec![FieldKind::Balance]);
    assert_eq!(
        batch.documents[0].outcome,
        DocumentOutcome::Skipped(SkipReason::NoEntries)
    );
}

#[test]
fn test_ledger_export_round_trip() {
    let (confs, docs) = setup();
    let (store, _) = DescriptorStore::load_dir(confs.path(), "json").unwrap();
    let mut aggregator = Aggregator::from_config(store, &TallyConfig::default());
    let batch = aggregator.aggregate_paths(docs.path()).unwrap();

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("accounts.json");
    batch.ledger.save(&path).unwrap();
    let loaded = Ledger::load(&path).unwrap();

    assert_eq!(loaded, batch.ledger);
}
