//! # Form Validation
//!
//! Each submitted form has an explicit `validate` returning either the
//! cleaned values or per-field errors.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FieldErrors, NON_FIELD_ERRORS};
use crate::models::Group;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;
/// Cap on a single text field of the post form, in bytes.
pub const MAX_TEXT_BYTES: usize = 64 * 1024;

/// A file received with a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Raw input of the create/edit post form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub text: String,
    /// Selected group id, empty for none
    pub group: String,
    pub image: Option<Upload>,
    /// The "clear" checkbox next to an existing image
    pub clear_image: bool,
}

/// A post form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<Upload>,
    pub clear_image: bool,
}

impl PostForm {
    /// Prefilled values for editing an existing post.
    pub fn from_post(text: &str, group_id: Option<Uuid>) -> Self {
        Self {
            text: text.to_string(),
            group: group_id.map(|id| id.to_string()).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// `groups` are the selectable choices; `max_upload` caps the image size in bytes.
    pub fn validate(&self, groups: &[Group], max_upload: usize) -> Result<CleanPost, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.text.trim().is_empty() {
            errors.add("text", REQUIRED);
        } else if self.text.len() > MAX_TEXT_BYTES {
            errors.add("text", format!("Ensure this value has at most {MAX_TEXT_BYTES} bytes."));
        }

        let group_id = match self.group.trim() {
            "" => None,
            raw => match Uuid::parse_str(raw) {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            },
        };

        // An empty file part means "no upload".
        let image = self.image.clone().filter(|upload| !upload.data.is_empty());
        if let Some(upload) = &image {
            if upload.data.len() > max_upload {
                errors.add("image", format!("The file is too large (limit {max_upload} bytes)."));
            }
        }

        errors.into_result(CleanPost {
            text: self.text.trim().to_string(),
            group_id,
            image,
            clear_image: self.clear_image,
        })
    }

    /// Whether the given group is the current selection.
    pub fn is_selected(&self, group: &Group) -> bool {
        self.group.trim() == group.id.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.text.trim().is_empty() {
            errors.add("text", REQUIRED);
        }
        errors.into_result(self.text.trim().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

impl SignupForm {
    /// Syntactic checks only; username availability is checked against the repo.
    pub fn validate(&self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
            );
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        } else {
            if self.password1.chars().count() < PASSWORD_MIN_LEN {
                errors.add(
                    "password2",
                    format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
                );
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password2", "This password is entirely numeric.");
            }
        }

        errors.into_result((username.to_string(), self.password1.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result((self.username.trim().to_string(), self.password.clone()))
    }

    pub fn invalid_credentials() -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.add(
            NON_FIELD_ERRORS,
            "Please enter a correct username and password. Note that both fields may be case-sensitive.",
        );
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![Group::new("g1", "Group one", "")]
    }

    #[test]
    fn post_text_is_required() {
        let form = PostForm { text: "   ".into(), ..Default::default() };
        let errors = form.validate(&groups(), 1024).unwrap_err();
        assert_eq!(errors.get("text"), [REQUIRED.to_string()]);
        assert!(!errors.contains("group"));
    }

    #[test]
    fn post_text_has_a_size_cap() {
        let at_cap = PostForm { text: "a".repeat(MAX_TEXT_BYTES), ..Default::default() };
        assert!(at_cap.validate(&groups(), 1024).is_ok());

        let over = PostForm { text: "a".repeat(MAX_TEXT_BYTES + 1), ..Default::default() };
        let errors = over.validate(&groups(), 1024).unwrap_err();
        assert!(errors.get("text")[0].contains("at most"));
    }

    #[test]
    fn post_group_is_optional() {
        let form = PostForm { text: "hello".into(), ..Default::default() };
        let clean = form.validate(&groups(), 1024).unwrap();
        assert_eq!(clean.group_id, None);
        assert_eq!(clean.text, "hello");
    }

    #[test]
    fn post_group_must_exist() {
        let known = groups();
        let ok = PostForm { text: "a".into(), group: known[0].id.to_string(), ..Default::default() };
        assert_eq!(ok.validate(&known, 1024).unwrap().group_id, Some(known[0].id));

        let missing = Uuid::now_v7().to_string();
        for bad in ["nonsense", missing.as_str()] {
            let form = PostForm { text: "a".into(), group: bad.to_string(), ..Default::default() };
            let errors = form.validate(&known, 1024).unwrap_err();
            assert_eq!(errors.get("group"), [INVALID_CHOICE.to_string()]);
        }
    }

    #[test]
    fn empty_upload_counts_as_none() {
        let form = PostForm {
            text: "a".into(),
            image: Some(Upload { filename: "".into(), data: vec![] }),
            ..Default::default()
        };
        assert_eq!(form.validate(&[], 1024).unwrap().image, None);
    }

    #[test]
    fn oversized_upload_rejected() {
        let form = PostForm {
            text: "a".into(),
            image: Some(Upload { filename: "big.png".into(), data: vec![0; 2048] }),
            ..Default::default()
        };
        assert!(form.validate(&[], 1024).unwrap_err().contains("image"));
    }

    #[test]
    fn comment_requires_text() {
        assert!(CommentForm::default().validate().is_err());
        assert_eq!(CommentForm { text: " hi ".into() }.validate().unwrap(), "hi");
    }

    #[test]
    fn signup_rules() {
        let good = SignupForm {
            username: "leo.t".into(),
            password1: "correct horse".into(),
            password2: "correct horse".into(),
        };
        assert_eq!(good.validate().unwrap(), ("leo.t".to_string(), "correct horse".to_string()));

        let mismatch = SignupForm { password2: "other value".into(), ..good.clone() };
        assert!(mismatch.validate().unwrap_err().contains("password2"));

        let short = SignupForm { password1: "abc".into(), password2: "abc".into(), ..good.clone() };
        assert!(short.validate().unwrap_err().contains("password2"));

        let numeric = SignupForm { password1: "12345678".into(), password2: "12345678".into(), ..good.clone() };
        assert!(numeric.validate().unwrap_err().contains("password2"));

        let bad_name = SignupForm { username: "no spaces".into(), ..good };
        assert!(bad_name.validate().unwrap_err().contains("username"));
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert!(errors.contains("username"));
        assert!(errors.contains("password"));
    }
}
