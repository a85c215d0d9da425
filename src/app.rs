//! Interactive application
//!
//! Owns the record store and the authenticator for one process run: load the
//! roster, log in, run the role's menu until logout, save on the way out.

use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::audit::AuditLog;
use crate::config_file::AppConfig;
use crate::credentials::CredentialStore;
use crate::error::{Result, RollbookError};
use crate::input::Prompt;
use crate::report::{render_statistics, render_table};
use crate::session::{AuthState, Session, SessionAuthenticator};
use crate::store::{DeleteOutcome, Durability, RecordStore};
use crate::types::{Action, SortKey};

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Login failed; nothing beyond the initial load happened
    Denied,
    /// Session ended normally (logout, end of input, or guest view)
    Finished,
}

/// Main application state
pub struct App<P: Prompt> {
    config: AppConfig,
    store: RecordStore,
    auth: SessionAuthenticator,
    prompt: P,
}

impl<P: Prompt> App<P> {
    pub fn new(config: AppConfig, prompt: P) -> Self {
        let audit = AuditLog::new(config.audit_log_path());
        let store = RecordStore::new(config.students_path(), audit.clone());
        let auth = SessionAuthenticator::with_attempts(
            CredentialStore::new(config.credentials_path()),
            audit,
            config.max_login_attempts,
        );
        Self {
            config,
            store,
            auth,
            prompt,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth.state()
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Run one full session.
    pub fn run(&mut self) -> Result<RunOutcome> {
        self.prompt.say("==== Student Record System ====");
        match self.store.load() {
            Ok(report) => {
                if let Some(line) = report.truncated_at {
                    self.prompt.say(&format!(
                        "Warning: student file unreadable from line {}; loaded {} record(s).",
                        line, report.loaded
                    ));
                }
            }
            Err(e) => {
                tracing::warn!("Failed to load student file: {}", e);
                self.prompt.say(&format!(
                    "Warning: could not load student records: {}. Changes will not be saved.",
                    e
                ));
            }
        }

        if self.auth.login(&mut self.prompt)? != AuthState::Authenticated {
            self.prompt.say("Access denied. Exiting.");
            return Ok(RunOutcome::Denied);
        }
        let session = self
            .auth
            .session()
            .cloned()
            .ok_or_else(|| RollbookError::auth_failed("no session after login"))?;
        self.prompt.say(&format!(
            "Welcome {}! Role: {}",
            session.username(),
            session.role()
        ));

        let session_result = if session.role().has_menu() {
            self.menu_loop(&session)
        } else {
            self.prompt.say("\n=== GUEST VIEW ===");
            self.view();
            Ok(())
        };

        if let Err(e) = self.store.save() {
            tracing::warn!("Final save failed: {}", e);
            self.prompt
                .say(&format!("Warning: could not save student records: {}", e));
        }
        session_result?;
        self.prompt.say("Goodbye!");
        Ok(RunOutcome::Finished)
    }

    fn menu_loop(&mut self, session: &Session) -> Result<()> {
        let menu = session.role().menu();
        loop {
            let mut text = format!(
                "\n=== {} MENU (User: {}) ===\n",
                session.role(),
                session.username()
            );
            for (i, action) in menu.iter().enumerate() {
                text.push_str(&format!("{}. {}\n", i + 1, action));
            }
            self.prompt.say(text.trim_end());

            let Some(choice) = self.prompt.read_line("Choice: ")? else {
                tracing::debug!("Input ended, logging out");
                break;
            };
            let action = match choice.trim().parse::<usize>() {
                Ok(n) if n >= 1 && n <= menu.len() => menu[n - 1],
                _ => {
                    self.prompt.say("Invalid choice.");
                    continue;
                }
            };

            if action == Action::Logout {
                self.prompt.say("Logging out.");
                break;
            }
            match self.dispatch(session, action) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::debug!("{} failed: {}", action, e);
                    self.prompt.say(&e.to_string());
                }
                Err(e) => return Err(e),
            }
        }
        self.auth.logout()?;
        Ok(())
    }

    fn dispatch(&mut self, session: &Session, action: Action) -> Result<()> {
        if !session.role().allows(action) {
            return Err(RollbookError::validation(format!(
                "{} is not available to {}",
                action,
                session.role()
            )));
        }
        match action {
            Action::AddStudent => self.add(session),
            Action::ViewStudents => {
                self.view();
                Ok(())
            }
            Action::UpdateStudent => self.update(session),
            Action::DeleteStudent => self.delete(session),
            Action::Search => self.search(),
            Action::Sort => self.sort(),
            Action::Statistics => {
                let text = render_statistics(self.store.class_statistics().as_ref());
                self.prompt.say(&text);
                Ok(())
            }
            Action::TakeAttendance => self.attendance(session),
            Action::Export => self.export(session),
            Action::ChangePassword => {
                self.auth.change_password(&mut self.prompt)?;
                self.prompt.say("Password changed successfully.");
                Ok(())
            }
            Action::Logout => Ok(()),
        }
    }

    fn ask(&mut self, text: &str) -> Result<String> {
        self.prompt
            .read_line(text)?
            .map(|s| s.trim().to_string())
            .ok_or_else(|| RollbookError::validation("input ended"))
    }

    fn ask_parsed<T: FromStr>(&mut self, text: &str) -> Result<T> {
        self.ask(text)?
            .parse()
            .map_err(|_| RollbookError::validation("invalid input"))
    }

    fn warn_if_unsaved(&mut self, durability: &Durability) {
        if let Durability::NotSaved(reason) = durability {
            self.prompt.say(&format!(
                "Warning: change kept in memory but not saved: {}",
                reason
            ));
        }
    }

    fn view(&mut self) {
        let table = render_table(self.store.records());
        self.prompt.say(&table);
    }

    fn add(&mut self, session: &Session) -> Result<()> {
        let roll: i32 = self.ask_parsed("Enter Roll Number: ")?;
        if self.store.find_by_roll(roll).is_ok() {
            return Err(RollbookError::DuplicateKey(roll));
        }
        let name = self.ask("Enter Name (no spaces): ")?;
        let marks: f64 = self.ask_parsed("Enter Marks: ")?;
        let durability = self.store.add(session, roll, &name, marks)?;
        self.prompt.say("Student added successfully.");
        self.warn_if_unsaved(&durability);
        Ok(())
    }

    fn update(&mut self, session: &Session) -> Result<()> {
        let roll: i32 = self.ask_parsed("Enter roll to update: ")?;
        let found = self.store.find_by_roll(roll)?;
        let summary = format!("Found: {} {} {:.2}", found.roll, found.name, found.marks);
        self.prompt.say(&summary);
        self.prompt
            .say("1. Update Name\n2. Update Marks\n3. Update Both");

        let choice: u8 = self.ask_parsed("Choice: ")?;
        let (new_name, new_marks) = match choice {
            1 => (Some(self.ask("Enter new name: ")?), None),
            2 => (None, Some(self.ask_parsed::<f64>("Enter new marks: ")?)),
            3 => {
                let name = self.ask("Enter new name: ")?;
                let marks = self.ask_parsed::<f64>("Enter new marks: ")?;
                (Some(name), Some(marks))
            }
            _ => return Err(RollbookError::validation("invalid choice")),
        };

        let durability = self
            .store
            .update(session, roll, new_name.as_deref(), new_marks)?;
        self.prompt.say("Student updated.");
        self.warn_if_unsaved(&durability);
        Ok(())
    }

    fn delete(&mut self, session: &Session) -> Result<()> {
        let roll: i32 = self.ask_parsed("Enter roll to delete: ")?;
        self.store.find_by_roll(roll)?;
        let answer = self.ask(&format!("Are you sure to delete roll {} (y/n)? ", roll))?;
        let confirmed = answer.eq_ignore_ascii_case("y");

        match self.store.delete(session, roll, confirmed)? {
            DeleteOutcome::Deleted(durability) => {
                self.prompt.say("Student deleted.");
                self.warn_if_unsaved(&durability);
            }
            DeleteOutcome::Cancelled => self.prompt.say("Delete cancelled."),
        }
        Ok(())
    }

    fn search(&mut self) -> Result<()> {
        let by: u8 = self.ask_parsed("Search by: 1.Roll 2.Name : ")?;
        if by == 1 {
            let roll: i32 = self.ask_parsed("Enter roll to search: ")?;
            let table = render_table([self.store.search_by_roll(roll)?]);
            self.prompt.say(&table);
        } else {
            let pattern = self.ask("Enter name or partial name to search: ")?;
            let hits = self.store.search_by_name(&pattern);
            let text = if hits.is_empty() {
                "No matches.".to_string()
            } else {
                render_table(hits)
            };
            self.prompt.say(&text);
        }
        Ok(())
    }

    fn sort(&mut self) -> Result<()> {
        let mut text = String::from("\nSort by:");
        for (i, key) in SortKey::iter().enumerate() {
            text.push_str(&format!("\n{}. {}", i + 1, key));
        }
        self.prompt.say(&text);

        let choice: usize = self.ask_parsed("Choice: ")?;
        let key = choice
            .checked_sub(1)
            .and_then(|i| SortKey::iter().nth(i))
            .ok_or_else(|| RollbookError::validation("invalid choice"))?;
        self.store.sort(key);
        self.prompt.say("Sorted successfully.");
        Ok(())
    }

    fn attendance(&mut self, session: &Session) -> Result<()> {
        if self.store.is_empty() {
            self.prompt.say("No students to mark attendance.");
            return Ok(());
        }
        self.prompt.say(
            "Mark attendance for this class.\nEnter present roll numbers one by one. Type 0 to finish.",
        );

        let mut present = Vec::new();
        loop {
            let Some(line) = self.prompt.read_line("Present roll (0 to end): ")? else {
                break;
            };
            let roll: i32 = match line.trim().parse() {
                Ok(0) => break,
                Ok(r) => r,
                Err(_) => {
                    self.prompt.say("Invalid.");
                    continue;
                }
            };
            let feedback = match self.store.find_by_roll(roll) {
                Ok(r) => format!("Marked present: {} {}", r.roll, r.name),
                Err(_) => format!("Roll {} not found.", roll),
            };
            self.prompt.say(&feedback);
            present.push(roll);
        }

        let report = self.store.mark_attendance(session, &present);
        if let Some(durability) = &report.durability {
            self.prompt.say("Attendance saved.");
            self.warn_if_unsaved(durability);
        }
        Ok(())
    }

    fn export(&mut self, session: &Session) -> Result<()> {
        let path = self.config.csv_path();
        self.store.export_csv(session, &path)?;
        self.prompt.say(&format!("Exported to {}", path.display()));
        Ok(())
    }
}

