//! # Validation Module
//!
//! Schema validation for sale requests and voucher uploads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (outside workspace)                                │
//! │  └── JSON deserialization (types only)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, positive integers                                │
//! │  └── Upload extension / size                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── FOREIGN KEY constraints                                           │
//! │  └── CHECK (stock >= 0)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Runs before any transaction is opened, so a malformed request never
//! touches the database.

use crate::error::ValidationError;
use crate::types::{canonical_unit_name, CreateSaleRequest, ValidSaleRequest, VoucherFile};
use crate::MAX_UNIT_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted voucher file extension.
pub const MAX_EXTENSION_LEN: usize = 10;

// =============================================================================
// Sale Request
// =============================================================================

/// Validates a sale creation request.
///
/// ## Rules
/// - `productId` is required and positive
/// - `quantity` is required and positive
/// - `unit` is required, non-blank, at most 20 characters
///
/// ## Example
/// ```rust
/// use mercado_core::types::CreateSaleRequest;
/// use mercado_core::validation::validate_create_request;
///
/// let valid = validate_create_request(&CreateSaleRequest::new(3, 50, " KG ")).unwrap();
/// assert_eq!(valid.unit, "kg");
///
/// assert!(validate_create_request(&CreateSaleRequest::default()).is_err());
/// ```
pub fn validate_create_request(request: &CreateSaleRequest) -> ValidationResult<ValidSaleRequest> {
    let product_id = required(request.product_id, "productId")?;
    if product_id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "productId".to_string(),
        });
    }

    let quantity = required(request.quantity, "quantity")?;
    validate_quantity(quantity)?;

    let unit = validate_unit_name(request.unit.as_deref().unwrap_or(""))?;

    Ok(ValidSaleRequest {
        product_id,
        quantity,
        unit,
    })
}

/// Validates an ordered quantity.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit-of-measure name and returns its canonical form.
pub fn validate_unit_name(name: &str) -> ValidationResult<String> {
    let name = canonical_unit_name(name);

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "unit".to_string(),
        });
    }

    if name.chars().count() > MAX_UNIT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "unit".to_string(),
            max: MAX_UNIT_NAME_LEN,
        });
    }

    Ok(name)
}

fn required<T>(value: Option<T>, field: &str) -> ValidationResult<T> {
    value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

// =============================================================================
// Voucher Upload
// =============================================================================

/// Validates an uploaded voucher and returns its lowercase extension.
///
/// ## Rules
/// - File must not be empty
/// - Extension comes from the original name's last `.` segment
/// - Extension is 1-10 ASCII alphanumerics (it ends up in a storage path)
///
/// ## Example
/// ```rust
/// use mercado_core::types::VoucherFile;
/// use mercado_core::validation::voucher_extension;
///
/// let file = VoucherFile::new("Boleta Marzo.PDF", b"%PDF".to_vec());
/// assert_eq!(voucher_extension(&file).unwrap(), "pdf");
///
/// let sneaky = VoucherFile::new("x.p/../df", b"..".to_vec());
/// assert!(voucher_extension(&sneaky).is_err());
/// ```
pub fn voucher_extension(file: &VoucherFile) -> ValidationResult<String> {
    if file.bytes.is_empty() {
        return Err(ValidationError::Required {
            field: "voucherFile".to_string(),
        });
    }

    let extension = file
        .original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "voucherFile".to_string(),
            reason: "file name has no extension".to_string(),
        })?;

    if extension.len() > MAX_EXTENSION_LEN || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ValidationError::InvalidFormat {
            field: "voucherFile".to_string(),
            reason: format!(
                "extension must be 1-{MAX_EXTENSION_LEN} letters or digits"
            ),
        });
    }

    Ok(extension.to_ascii_lowercase())
}

// =============================================================================
// Unit Tests
// =============================================================================
