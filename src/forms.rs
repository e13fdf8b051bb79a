// src/forms.rs
//! Submitted forms and their validation.
//!
//! Every form deserializes with missing fields defaulted so that an absent
//! field becomes a field-level message rather than a rejected request.
//! Checks that need the database (duplicate email, current password) live
//! in the handlers and report through the same [`FieldErrors`].

use serde::Deserialize;

use crate::error::{AppError, FieldErrors};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const COMMENT_NAME_MAX: usize = 80;
const NAME_MAX: usize = 150;
const PHONE_MAX: usize = 20;

const REQUIRED: &str = "This field is required.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .all(|part| !part.is_empty() && !part.starts_with('-') && !part.ends_with('-'))
        && domain.contains('.')
}

fn check_new_password(
    errors: &mut FieldErrors,
    field: &'static str,
    confirm_field: &'static str,
    password: &str,
    confirmation: &str,
) {
    if password.is_empty() {
        errors.add(field, REQUIRED);
    } else {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                field,
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    MIN_PASSWORD_LENGTH
                ),
            );
        }
        if password.chars().all(|c| c.is_ascii_digit()) {
            errors.add(field, "This password is entirely numeric.");
        }
    }
    if confirmation.is_empty() {
        errors.add(confirm_field, REQUIRED);
    } else if !password.is_empty() && password != confirmation {
        errors.add(confirm_field, PASSWORD_MISMATCH);
    }
}

fn check_email(errors: &mut FieldErrors, raw: &str) -> String {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        errors.add("email", REQUIRED);
    } else if !is_valid_email(&email) {
        errors.add("email", INVALID_EMAIL);
    }
    email
}

fn check_max(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max,
                value.chars().count()
            ),
        );
    }
}

/// Splits a full name into the first word and the rest.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
    pub accept_terms: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<NewAccount, AppError> {
        let mut errors = FieldErrors::new();

        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            errors.add("full_name", REQUIRED);
        }
        check_max(&mut errors, "full_name", full_name, NAME_MAX);
        let email = check_email(&mut errors, &self.email);
        check_new_password(
            &mut errors,
            "password1",
            "password2",
            &self.password1,
            &self.password2,
        );
        if self.accept_terms.is_none() {
            errors.add("accept_terms", REQUIRED);
        }

        errors.into_result()?;
        let (first_name, last_name) = split_full_name(full_name);
        Ok(NewAccount {
            first_name,
            last_name,
            email,
            password: self.password1.clone(),
        })
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LoginForm {
    /// Email or username.
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()
    }

    /// Only same-site paths are honoured as redirect targets. Browsers
    /// read `/\host` like `//host`, so backslashes never pass.
    pub fn safe_next(&self) -> Option<&str> {
        self.next.as_deref().map(str::trim).filter(|next| is_local_path(next))
    }
}

fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub bio: String,
    pub current_plan: String,
    pub email_notifications: Option<String>,
    pub sms_notifications: Option<String>,
    pub promo_notifications: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub bio: String,
    pub current_plan: Option<i64>,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub promo_notifications: bool,
}

pub fn parse_plan_choice(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, invalid_choice());
            None
        }
    }
}

pub fn invalid_choice() -> &'static str {
    "Select a valid choice. That choice is not one of the available choices."
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileUpdate, AppError> {
        let mut errors = FieldErrors::new();

        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        check_max(&mut errors, "first_name", &first_name, NAME_MAX);
        check_max(&mut errors, "last_name", &last_name, NAME_MAX);
        let email = check_email(&mut errors, &self.email);
        let phone_number = self.phone_number.trim().to_string();
        check_max(&mut errors, "phone_number", &phone_number, PHONE_MAX);
        let current_plan = parse_plan_choice(&mut errors, "current_plan", &self.current_plan);

        errors.into_result()?;
        Ok(ProfileUpdate {
            first_name,
            last_name,
            email,
            phone_number,
            bio: self.bio.trim().to_string(),
            current_plan,
            email_notifications: self.email_notifications.is_some(),
            sms_notifications: self.sms_notifications.is_some(),
            promo_notifications: self.promo_notifications.is_some(),
        })
    }
}

/// Account settings page; `action` picks which embedded form is meant.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SettingsForm {
    pub action: String,
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
    pub confirmation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    ChangePassword,
    DeleteAccount,
}

impl SettingsForm {
    pub fn action(&self) -> Result<SettingsAction, AppError> {
        match self.action.trim() {
            "change_password" => Ok(SettingsAction::ChangePassword),
            "delete_account" => Ok(SettingsAction::DeleteAccount),
            other => Err(AppError::BadRequest(format!(
                "Unknown settings action: {:?}",
                other
            ))),
        }
    }

    /// Local checks for a password change; the old password is verified
    /// against the stored hash by the caller.
    pub fn validate_password_change(&self) -> Result<String, AppError> {
        let mut errors = FieldErrors::new();
        if self.old_password.is_empty() {
            errors.add("old_password", REQUIRED);
        }
        check_new_password(
            &mut errors,
            "new_password1",
            "new_password2",
            &self.new_password1,
            &self.new_password2,
        );
        errors.into_result()?;
        Ok(self.new_password1.clone())
    }

    pub fn validate_account_delete(&self) -> Result<(), AppError> {
        confirm_delete(&self.confirmation)
    }
}

/// Case-insensitive "delete", surrounding whitespace ignored.
pub fn confirm_delete(confirmation: &str) -> Result<(), AppError> {
    if confirmation.trim().eq_ignore_ascii_case("delete") {
        Ok(())
    } else {
        Err(AppError::field(
            "confirmation",
            "Please type DELETE to confirm account removal.",
        ))
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SubscriptionForm {
    pub action: String,
    pub plan: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    /// Select the given plan, or clear when none.
    Change(Option<i64>),
    Cancel,
}

impl SubscriptionForm {
    pub fn validate(&self) -> Result<SubscriptionAction, AppError> {
        match self.action.trim() {
            "change" => {
                let mut errors = FieldErrors::new();
                let plan = parse_plan_choice(&mut errors, "plan", &self.plan);
                errors.into_result()?;
                Ok(SubscriptionAction::Change(plan))
            }
            "cancel" => Ok(SubscriptionAction::Cancel),
            other => Err(AppError::BadRequest(format!(
                "Unknown subscription action: {:?}",
                other
            ))),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CommentForm {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub name: String,
    pub body: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<NewComment, AppError> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim().to_string();
        let body = self.body.trim().to_string();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        }
        check_max(&mut errors, "name", &name, COMMENT_NAME_MAX);
        if body.is_empty() {
            errors.add("body", REQUIRED);
        }
        errors.into_result()?;
        Ok(NewComment { name, body })
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct FavoriteRemoveForm {
    pub movie_id: String,
}

impl FavoriteRemoveForm {
    pub fn movie_id(&self) -> Result<i64, AppError> {
        self.movie_id
            .trim()
            .parse()
            .map_err(|_| AppError::field("movie_id", invalid_choice()))
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct DownloadForm {
    pub quality: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation(fields) => fields,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn signup() -> SignUpForm {
        SignUpForm {
            full_name: "Ada  Byron King".to_string(),
            email: "  Ada@Example.COM ".to_string(),
            password1: "analytical-engine".to_string(),
            password2: "analytical-engine".to_string(),
            accept_terms: Some("on".to_string()),
        }
    }

    #[test]
    fn signup_cleans_name_and_email() {
        let account = signup().validate().unwrap();
        assert_eq!(account.first_name, "Ada");
        assert_eq!(account.last_name, "Byron King");
        assert_eq!(account.email, "ada@example.com");
    }

    #[test]
    fn signup_reports_every_problem() {
        let form = SignUpForm {
            full_name: " ".to_string(),
            email: "not-an-email".to_string(),
            password1: "12345678".to_string(),
            password2: "87654321".to_string(),
            accept_terms: None,
        };
        let errors = fields(form.validate().unwrap_err());

        assert!(errors.contains("full_name"));
        assert_eq!(errors.get("email").unwrap(), [INVALID_EMAIL]);
        assert_eq!(
            errors.get("password1").unwrap(),
            ["This password is entirely numeric."]
        );
        assert_eq!(errors.get("password2").unwrap(), [PASSWORD_MISMATCH]);
        assert!(errors.contains("accept_terms"));
    }

    #[test]
    fn short_password_is_rejected() {
        let mut form = signup();
        form.password1 = "short".to_string();
        form.password2 = "short".to_string();
        let errors = fields(form.validate().unwrap_err());
        assert!(errors.get("password1").unwrap()[0].contains("at least 8 characters"));
        assert!(!errors.contains("password2"));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.io"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.io"));
        assert!(!is_valid_email("a@@b.io"));
        assert!(!is_valid_email("a b@c.io"));
        assert!(!is_valid_email("a@b..io"));
    }

    #[test]
    fn login_next_must_be_local() {
        let mut form = LoginForm::default();
        form.next = Some("/account/favorites".to_string());
        assert_eq!(form.safe_next(), Some("/account/favorites"));
        form.next = Some("//evil.example".to_string());
        assert_eq!(form.safe_next(), None);
        form.next = Some("https://evil.example".to_string());
        assert_eq!(form.safe_next(), None);
        form.next = Some("/\\evil.example/phish".to_string());
        assert_eq!(form.safe_next(), None);
        form.next = Some("/account\\..\\x".to_string());
        assert_eq!(form.safe_next(), None);
        form.next = Some("/\tevil.example".to_string());
        assert_eq!(form.safe_next(), None);
        form.next = Some("/account/\nSet-Cookie".to_string());
        assert_eq!(form.safe_next(), None);
        form.next = Some("  /search?q=heat  ".to_string());
        assert_eq!(form.safe_next(), Some("/search?q=heat"));
    }

    #[test]
    fn profile_checkboxes_and_plan() {
        let form = ProfileForm {
            email: "viewer@example.com".to_string(),
            current_plan: "3".to_string(),
            sms_notifications: Some("on".to_string()),
            ..Default::default()
        };
        let update = form.validate().unwrap();
        assert_eq!(update.current_plan, Some(3));
        assert!(update.sms_notifications);
        assert!(!update.email_notifications);

        let cleared = ProfileForm {
            email: "viewer@example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(cleared.validate().unwrap().current_plan, None);
    }

    #[test]
    fn profile_rejects_garbage_plan_and_long_phone() {
        let form = ProfileForm {
            email: "viewer@example.com".to_string(),
            current_plan: "gold".to_string(),
            phone_number: "1".repeat(21),
            ..Default::default()
        };
        let errors = fields(form.validate().unwrap_err());
        assert!(errors.contains("current_plan"));
        assert!(errors.contains("phone_number"));
    }

    #[test]
    fn delete_confirmation_is_case_insensitive() {
        assert!(confirm_delete("DELETE").is_ok());
        assert!(confirm_delete("  delete ").is_ok());
        assert!(confirm_delete("Delete").is_ok());

        for attempt in ["", "DELET", "delete me", "remove", "DELETE!"] {
            let errors = fields(confirm_delete(attempt).unwrap_err());
            assert_eq!(
                errors.get("confirmation").unwrap(),
                ["Please type DELETE to confirm account removal."]
            );
        }
    }

    #[test]
    fn settings_dispatch() {
        let mut form = SettingsForm {
            action: "delete_account".to_string(),
            ..Default::default()
        };
        assert_eq!(form.action().unwrap(), SettingsAction::DeleteAccount);
        form.action = "change_password".to_string();
        assert_eq!(form.action().unwrap(), SettingsAction::ChangePassword);
        form.action = "explode".to_string();
        assert!(matches!(form.action(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn password_change_requires_old_and_matching_new() {
        let form = SettingsForm {
            action: "change_password".to_string(),
            new_password1: "new-password-1".to_string(),
            new_password2: "new-password-2".to_string(),
            ..Default::default()
        };
        let errors = fields(form.validate_password_change().unwrap_err());
        assert!(errors.contains("old_password"));
        assert!(errors.contains("new_password2"));
    }

    #[test]
    fn subscription_form_actions() {
        let change = SubscriptionForm {
            action: "change".to_string(),
            plan: "2".to_string(),
        };
        assert_eq!(change.validate().unwrap(), SubscriptionAction::Change(Some(2)));

        let clear = SubscriptionForm {
            action: "change".to_string(),
            plan: String::new(),
        };
        assert_eq!(clear.validate().unwrap(), SubscriptionAction::Change(None));

        let cancel = SubscriptionForm {
            action: "cancel".to_string(),
            plan: "ignored".to_string(),
        };
        assert_eq!(cancel.validate().unwrap(), SubscriptionAction::Cancel);

        let unknown = SubscriptionForm::default();
        assert!(matches!(unknown.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn comment_requires_name_and_body() {
        let errors = fields(CommentForm::default().validate().unwrap_err());
        assert!(errors.contains("name"));
        assert!(errors.contains("body"));

        let long_name = CommentForm {
            name: "x".repeat(COMMENT_NAME_MAX + 1),
            body: "Great film".to_string(),
        };
        assert!(fields(long_name.validate().unwrap_err()).contains("name"));

        let ok = CommentForm {
            name: " Sam ".to_string(),
            body: " Loved it ".to_string(),
        };
        assert_eq!(
            ok.validate().unwrap(),
            NewComment {
                name: "Sam".to_string(),
                body: "Loved it".to_string()
            }
        );
    }

    #[test]
    fn full_name_split() {
        assert_eq!(split_full_name("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(split_full_name(""), (String::new(), String::new()));
    }
}
