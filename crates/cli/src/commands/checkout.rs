//! Checkout command: validate the address and render the WhatsApp handoff.
//!
//! # Usage
//!
//! ```bash
//! kirana checkout --name "Asha Rao" --mobile 9876543210 \
//!     --house 12/4 --area "Jayanagar 4th Block" --pincode 560041
//! ```
//!
//! City and state autofill from the pincode; pass `--city` or `--state`
//! to override what the lookup returned. A failed lookup is advisory:
//! the command reports it and validation decides whether the address is
//! complete.
//!
//! # Environment Variables
//!
//! - `KIRANA_BASE_URL` - Public site URL for product links
//! - `KIRANA_CONTACT_PHONE` - WhatsApp number the order is sent to

use clap::Args;
use kirana_storefront::address::AddressField;
use kirana_storefront::checkout::CheckoutHandoff;
use kirana_storefront::error::AppError;

use super::open_state;

/// Arguments for the `checkout` command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Recipient name
    #[arg(long)]
    name: String,

    /// 10-digit mobile number
    #[arg(long)]
    mobile: String,

    /// House or flat number
    #[arg(long = "house")]
    house_number: String,

    /// Area, street, or locality
    #[arg(long)]
    area: String,

    /// 6-digit pincode; city and state autofill from it
    #[arg(long)]
    pincode: String,

    /// Override the autofilled city
    #[arg(long)]
    city: Option<String>,

    /// Override the autofilled state
    #[arg(long)]
    state: Option<String>,
}

/// Fill the address form, wait for the pincode lookup, and render the
/// order.
pub async fn run(args: CheckoutArgs) -> Result<(), AppError> {
    let mut app = open_state()?;

    {
        let form = app.address_mut();
        form.set_field(AddressField::Name, &args.name);
        form.set_field(AddressField::Mobile, &args.mobile);
        form.set_field(AddressField::HouseNumber, &args.house_number);
        form.set_field(AddressField::Area, &args.area);
        form.set_pincode(&args.pincode);
    }
    app.address_mut().await_lookup().await;

    if let Some(error) = app.address().lookup_error() {
        tracing::warn!("{error}");
    }

    if let Some(city) = &args.city {
        app.address_mut().set_field(AddressField::City, city);
    }
    if let Some(state) = &args.state {
        app.address_mut().set_field(AddressField::State, state);
    }

    match app.checkout() {
        Ok(handoff) => {
            print_order(&handoff);
            Ok(())
        }
        Err(AppError::AddressInvalid(fields)) => {
            for (field, message) in app.address().errors() {
                tracing::warn!("{field}: {message}");
            }
            Err(AppError::AddressInvalid(fields))
        }
        Err(err) => Err(err),
    }
}

#[allow(clippy::print_stdout)]
fn print_order(handoff: &CheckoutHandoff) {
    println!("{}", handoff.message);
    println!();
    println!("Open on your phone: {}", handoff.mobile_url);
    println!("Open on the web:    {}", handoff.web_url);
}
