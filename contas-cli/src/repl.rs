//! Line-oriented command loop over the accounts screen.

use std::io::Write;
use std::str::FromStr;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use contas_app::screen::{AccountField, AccountsScreen, AccountsState, ModalState};
use contas_app::AppState;
use contas_core::utils::mask_account_number;

const HELP: &str = "\
Commands:
  list                    show your accounts
  refresh                 reload from the server
  add                     open an empty form
  edit <id>               open the form for an account
  set <field> <value>     fill a form field (description, bank, branch, number, code)
  save                    save the open form
  cancel                  close the form without saving
  delete <id>             ask to delete an account
  confirm | abort         answer a pending delete
  login <email> <pass>    sign in
  logout                  sign out
  help                    this text
  quit                    leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Refresh,
    Add,
    Edit(i64),
    Set(AccountField, String),
    Save,
    Cancel,
    Delete(i64),
    Confirm,
    Abort,
    Login { email: String, password: String },
    Logout,
    Help,
    Quit,
}

fn parse_id(arg: &str) -> Result<i64, String> {
    arg.trim()
        .parse()
        .map_err(|_| format!("expected an account id, got {arg:?}"))
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let command = match word.to_ascii_lowercase().as_str() {
            "list" | "ls" => Self::List,
            "refresh" => Self::Refresh,
            "add" | "new" => Self::Add,
            "edit" => Self::Edit(parse_id(rest)?),
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(f, v)| (f, v.trim()));
                if field.is_empty() {
                    return Err("usage: set <field> <value>".to_string());
                }
                Self::Set(field.parse()?, value.to_string())
            }
            "save" => Self::Save,
            "cancel" => Self::Cancel,
            "delete" | "rm" => Self::Delete(parse_id(rest)?),
            "confirm" | "yes" => Self::Confirm,
            "abort" | "no" => Self::Abort,
            "login" => match rest.split_whitespace().collect::<Vec<_>>()[..] {
                [email, password] => Self::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => return Err("usage: login <email> <password>".to_string()),
            },
            "logout" => Self::Logout,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command {other:?}, try `help`")),
        };
        Ok(command)
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Read commands until `quit` or end of input.
pub async fn run(state: &AppState, screen: &AccountsScreen) -> Result<()> {
    render_accounts(&screen.snapshot().await);
    println!("Type `help` for commands.");
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    execute(state, screen, command).await;
                    show_alert(screen).await;
                }
                Err(e) => println!("{e}"),
            }
        }
        prompt();
    }
    Ok(())
}

async fn execute(state: &AppState, screen: &AccountsScreen, command: Command) {
    match command {
        Command::List => render_accounts(&screen.snapshot().await),
        Command::Refresh => {
            screen.refresh().await;
            render_accounts(&screen.snapshot().await);
        }
        Command::Add => {
            screen.open_add().await;
            show_form(screen).await;
        }
        Command::Edit(id) => match screen.snapshot().await.find(id).cloned() {
            Some(account) => {
                screen.open_edit(&account).await;
                show_form(screen).await;
            }
            None => println!("No account with id {id}."),
        },
        Command::Set(field, value) => {
            if screen.snapshot().await.is_modal_open() {
                screen.set_field(field, value).await;
                show_form(screen).await;
            } else {
                println!("No form open. Use `add` or `edit <id>` first.");
            }
        }
        Command::Save => {
            if screen.submit().await {
                println!("Saved.");
                render_accounts(&screen.snapshot().await);
            } else {
                show_form(screen).await;
            }
        }
        Command::Cancel => screen.close_modal().await,
        Command::Delete(id) => match screen.snapshot().await.find(id).cloned() {
            Some(account) => {
                screen.request_delete(&account).await;
                println!(
                    "Delete \"{}\"? Type `confirm` or `abort`.",
                    account.description
                );
            }
            None => println!("No account with id {id}."),
        },
        Command::Confirm => {
            if screen.confirm_delete().await {
                println!("Deleted.");
                render_accounts(&screen.snapshot().await);
            } else if screen.snapshot().await.alert.is_none() {
                println!("Nothing to confirm.");
            }
        }
        Command::Abort => screen.cancel_delete().await,
        Command::Login { email, password } => match state.auth_service.sign_in(&email, &password).await
        {
            Ok(user) => {
                println!("Signed in as {}.", user.email.as_deref().unwrap_or(&user.id));
                screen.refresh().await;
                render_accounts(&screen.snapshot().await);
            }
            Err(e) => println!("{e}"),
        },
        Command::Logout => match state.auth_service.sign_out().await {
            Ok(()) => println!("Signed out."),
            Err(e) => println!("Signed out locally: {e}"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

/// Print and dismiss the pending alert, if any.
async fn show_alert(screen: &AccountsScreen) {
    if let Some(alert) = screen.snapshot().await.alert {
        println!("! {}", alert.message);
        screen.dismiss_alert().await;
    }
}

async fn show_form(screen: &AccountsScreen) {
    if let Some(modal) = screen.snapshot().await.modal {
        render_form(&modal);
    }
}

fn render_accounts(state: &AccountsState) {
    if state.owner_id.is_none() {
        return;
    }
    if state.accounts.is_empty() {
        println!("No accounts yet. Use `add` to create one.");
        return;
    }
    println!(
        "{:>5}  {:<40}  {:>5}  {:>6}  NUMBER",
        "ID", "DESCRIPTION", "BANK", "BRANCH"
    );
    for account in &state.accounts {
        let id = account.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        println!(
            "{:>5}  {:<40}  {:>5}  {:>6}  {}",
            id,
            account.description,
            account.bank_code,
            account.branch_code,
            mask_account_number(&account.account_number)
        );
    }
}

fn render_form(modal: &ModalState) {
    println!("{}", if modal.is_edit() { "Edit account" } else { "New account" });
    for field in AccountField::ALL {
        let value = modal.form.get(field);
        match modal.field_error(field) {
            Some(error) => println!("  {:<16} {value:<24} ! {error}", field.label()),
            None => println!("  {:<16} {value}", field.label()),
        }
    }
    if let Some(error) = &modal.error {
        println!("  ! {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!("list".parse(), Ok(Command::List));
        assert_eq!("  SAVE ".parse(), Ok(Command::Save));
        assert_eq!("q".parse(), Ok(Command::Quit));
        assert_eq!("edit 12".parse(), Ok(Command::Edit(12)));
        assert_eq!("rm 3".parse(), Ok(Command::Delete(3)));
    }

    #[test]
    fn set_keeps_spaces_in_value() {
        assert_eq!(
            "set desc  Conta  Corrente ".parse(),
            Ok(Command::Set(
                AccountField::Description,
                "Conta  Corrente".to_string()
            ))
        );
        assert_eq!(
            "set number".parse(),
            Ok(Command::Set(AccountField::AccountNumber, String::new()))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!("edit abc".parse::<Command>().is_err());
        assert!("set".parse::<Command>().is_err());
        assert!("set iban 1".parse::<Command>().is_err());
        assert!("login only-email".parse::<Command>().is_err());
        assert!("frobnicate".parse::<Command>().is_err());
    }

    #[test]
    fn parses_login() {
        assert_eq!(
            "login ana@example.com s3cret".parse(),
            Ok(Command::Login {
                email: "ana@example.com".to_string(),
                password: "s3cret".to_string(),
            })
        );
    }
}
