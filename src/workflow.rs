//! # Contract Transaction
//!
//! One signed contract from request to record:
//!
//! ```text
//! validate ids → compose → save → upload → register loan → share
//! ```
//!
//! Steps run strictly in order and the first failure stops the run. Nothing
//! is written before composition succeeds. Once the file is saved it is
//! never removed, so after an upload, registration or share failure the
//! user can still send it by hand.

use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use log::{info, warn};

use crate::clock::Clock;
use crate::error::ContractError;
use crate::gateway::{AssetHost, LoanRegistry, OpenLoanRequest, ReturnLoanRequest, ShareTarget};
use crate::model::{ContractKind, ContractRequest};
use crate::render_contract;
use crate::storage::{contract_file_name, save_contract};

/// What a completed transaction left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub path: PathBuf,
    pub url: String,
    pub shared: bool,
}

/// The registry call a request will make, resolved before anything is drawn.
enum Registration<'a> {
    Open { user_id: &'a str, object_id: &'a str },
    Close { loan_id: &'a str },
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ContractError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ContractError::MissingField(field))
}

fn registration(request: &ContractRequest) -> Result<Registration<'_>, ContractError> {
    match request.kind {
        ContractKind::LoanOpening => Ok(Registration::Open {
            user_id: required(request.party.id.as_deref(), "party.id")?,
            object_id: required(Some(request.object.id.as_str()), "object.id")?,
        }),
        ContractKind::LoanReturn => Ok(Registration::Close {
            loan_id: required(request.loan_id.as_deref(), "loanId")?,
        }),
    }
}

pub struct ContractTransaction<'a> {
    pub output_dir: &'a Path,
    pub assets: &'a dyn AssetHost,
    pub registry: &'a dyn LoanRegistry,
    pub share_target: &'a dyn ShareTarget,
    pub clock: &'a dyn Clock,
}

impl ContractTransaction<'_> {
    pub fn run(&self, request: &ContractRequest, share: bool) -> Result<TransactionOutcome, ContractError> {
        let registration = registration(request)?;

        let document = render_contract(request, self.clock)?;
        let file_name = contract_file_name(request.kind, self.clock);
        let path = save_contract(self.output_dir, &file_name, &document.bytes)?;

        let url = self
            .assets
            .upload(&file_name, &document.bytes)
            .map_err(|e| retained(&path, e))?;

        let registered = match registration {
            Registration::Open { user_id, object_id } => self.registry.open_loan(&OpenLoanRequest {
                user_id: user_id.to_string(),
                ceiit_id: object_id.to_string(),
                date: self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true),
                link_open_loan: url.clone(),
            }),
            Registration::Close { loan_id } => self.registry.return_loan(&ReturnLoanRequest {
                loan_id: loan_id.to_string(),
                link_close_loan: url.clone(),
            }),
        };
        registered.map_err(|e| retained(&path, e))?;

        if share {
            if !self.share_target.is_available() {
                return Err(retained(&path, ContractError::ShareUnavailable));
            }
            self.share_target.share(&path).map_err(|e| retained(&path, e))?;
        }

        info!("Contract transaction complete: {} -> {}", path.display(), url);
        Ok(TransactionOutcome { path, url, shared: share })
    }
}

fn retained(path: &Path, error: ContractError) -> ContractError {
    warn!("{}; contract kept at {}", error, path.display());
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::clock::FixedClock;
    use crate::model::{LoanParty, LoanableObject, SignatureSources};

    const DOT: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[derive(Default)]
    struct FakeHost {
        fail: bool,
        uploads: RefCell<Vec<String>>,
    }

    impl AssetHost for FakeHost {
        fn upload(&self, file_name: &str, _bytes: &[u8]) -> Result<String, ContractError> {
            if self.fail {
                return Err(ContractError::Upload {
                    cause: "503 Service Unavailable".into(),
                });
            }
            self.uploads.borrow_mut().push(file_name.to_string());
            Ok(format!("https://cdn.example/{}", file_name))
        }
    }

    #[derive(Default)]
    struct FakeRegistry {
        fail: bool,
        opened: RefCell<Vec<OpenLoanRequest>>,
        returned: RefCell<Vec<ReturnLoanRequest>>,
    }

    impl FakeRegistry {
        fn answer(&self) -> Result<(), ContractError> {
            if self.fail {
                return Err(ContractError::Registry {
                    cause: "500 Internal Server Error".into(),
                });
            }
            Ok(())
        }
    }

    impl LoanRegistry for FakeRegistry {
        fn open_loan(&self, request: &OpenLoanRequest) -> Result<(), ContractError> {
            self.opened.borrow_mut().push(request.clone());
            self.answer()
        }

        fn return_loan(&self, request: &ReturnLoanRequest) -> Result<(), ContractError> {
            self.returned.borrow_mut().push(request.clone());
            self.answer()
        }
    }

    #[derive(Default)]
    struct FakeShare {
        shared: RefCell<Vec<PathBuf>>,
    }

    impl ShareTarget for FakeShare {
        fn is_available(&self) -> bool {
            true
        }

        fn share(&self, path: &Path) -> Result<(), ContractError> {
            self.shared.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    fn request(kind: ContractKind) -> ContractRequest {
        ContractRequest {
            kind,
            party: LoanParty {
                id: Some("user-1".into()),
                name: "Ana".into(),
                sur_name: "Ruiz".into(),
                tuition: "123".into(),
                cellphone: None,
            },
            object: LoanableObject {
                id: "abc1".into(),
                name: "Drill".into(),
                ..Default::default()
            },
            custodian_name: "Carlos".into(),
            cellphone: Some("555-0100".into()),
            loan_id: Some("loan-9".into()),
            header_image: None,
            signatures: SignatureSources {
                custodian: Some(DOT.into()),
                counterparty: Some(DOT.into()),
            },
        }
    }

    fn clock() -> FixedClock {
        FixedClock::on(2026, 10, 17).unwrap()
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_opening_saves_uploads_registers_and_shares() {
        let dir = tempfile::tempdir().unwrap();
        let (host, registry, share) = (FakeHost::default(), FakeRegistry::default(), FakeShare::default());
        let tx = ContractTransaction {
            output_dir: dir.path(),
            assets: &host,
            registry: &registry,
            share_target: &share,
            clock: &clock(),
        };

        let outcome = tx.run(&request(ContractKind::LoanOpening), true).unwrap();

        assert!(outcome.path.is_file());
        assert!(outcome.path.file_name().unwrap().to_str().unwrap().starts_with("loan_contract_"));
        assert!(std::fs::read(&outcome.path).unwrap().starts_with(b"%PDF"));
        assert_eq!(outcome.url, format!("https://cdn.example/{}", host.uploads.borrow()[0]));

        let opened = registry.opened.borrow();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].user_id, "user-1");
        assert_eq!(opened[0].ceiit_id, "abc1");
        assert_eq!(opened[0].date, "2026-10-17T00:00:00.000Z");
        assert_eq!(opened[0].link_open_loan, outcome.url);
        assert_eq!(share.shared.borrow().as_slice(), &[outcome.path.clone()]);
    }

    #[test]
    fn test_return_closes_loan() {
        let dir = tempfile::tempdir().unwrap();
        let (host, registry) = (FakeHost::default(), FakeRegistry::default());
        let tx = ContractTransaction {
            output_dir: dir.path(),
            assets: &host,
            registry: &registry,
            share_target: &crate::gateway::NoShare,
            clock: &clock(),
        };

        let outcome = tx.run(&request(ContractKind::LoanReturn), false).unwrap();

        assert!(!outcome.shared);
        let returned = registry.returned.borrow();
        assert_eq!(returned[0].loan_id, "loan-9");
        assert_eq!(returned[0].link_close_loan, outcome.url);
        assert!(registry.opened.borrow().is_empty());
    }

    #[test]
    fn test_return_without_loan_id_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(ContractKind::LoanReturn);
        req.loan_id = None;
        let tx = ContractTransaction {
            output_dir: dir.path(),
            assets: &FakeHost::default(),
            registry: &FakeRegistry::default(),
            share_target: &FakeShare::default(),
            clock: &clock(),
        };

        assert!(matches!(tx.run(&req, false), Err(ContractError::MissingField("loanId"))));
        assert_eq!(files_in(dir.path()), 0);
    }

    #[test]
    fn test_missing_signature_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(ContractKind::LoanOpening);
        req.signatures.custodian = None;
        let host = FakeHost::default();
        let tx = ContractTransaction {
            output_dir: dir.path(),
            assets: &host,
            registry: &FakeRegistry::default(),
            share_target: &FakeShare::default(),
            clock: &clock(),
        };

        assert!(matches!(tx.run(&req, false), Err(ContractError::MissingSignature { .. })));
        assert_eq!(files_in(dir.path()), 0);
        assert!(host.uploads.borrow().is_empty());
    }

    #[test]
    fn test_upload_failure_keeps_file_and_skips_registration() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost {
            fail: true,
            ..Default::default()
        };
        let registry = FakeRegistry::default();
        let tx = ContractTransaction {
            output_dir: dir.path(),
            assets: &host,
            registry: &registry,
            share_target: &FakeShare::default(),
            clock: &clock(),
        };

        let err = tx.run(&request(ContractKind::LoanOpening), true).unwrap_err();
        assert!(matches!(err, ContractError::Upload { .. }));
        assert_eq!(files_in(dir.path()), 1);
        assert!(registry.opened.borrow().is_empty());
    }

    #[test]
    fn test_registration_failure_keeps_file_and_skips_share() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::default();
        let registry = FakeRegistry {
            fail: true,
            ..Default::default()
        };
        let share = FakeShare::default();
        let tx = ContractTransaction {
            output_dir: dir.path(),
            assets: &host,
            registry: &registry,
            share_target: &share,
            clock: &clock(),
        };

        for kind in [ContractKind::LoanOpening, ContractKind::LoanReturn] {
            let err = tx.run(&request(kind), true).unwrap_err();
            assert!(matches!(err, ContractError::Registry { .. }));
        }
        assert_eq!(files_in(dir.path()), 2);
        assert_eq!(host.uploads.borrow().len(), 2);
        assert_eq!(registry.opened.borrow().len(), 1);
        assert_eq!(registry.returned.borrow().len(), 1);
        assert!(share.shared.borrow().is_empty());
    }

    #[test]
    fn test_share_unavailable_after_registration() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FakeRegistry::default();
        let tx = ContractTransaction {
            output_dir: dir.path(),
            assets: &FakeHost::default(),
            registry: &registry,
            share_target: &crate::gateway::NoShare,
            clock: &clock(),
        };

        let err = tx.run(&request(ContractKind::LoanOpening), true).unwrap_err();
        assert!(matches!(err, ContractError::ShareUnavailable));
        assert_eq!(registry.opened.borrow().len(), 1);
        assert_eq!(files_in(dir.path()), 1);
    }
}
