//! Shipping address form with debounced pincode resolution.
//!
//! Editing the pincode does not fetch immediately: a 6-digit value arms a
//! debounce timer, and only the timer's expiry starts a lookup. Every
//! pincode edit advances a generation counter and cancels the previous
//! in-flight task, and lookup results are applied only when their
//! generation still matches, so a slow response for an old pincode can
//! never overwrite the fields for a newer one.
//!
//! Lookup failures are advisory. They surface through
//! [`AddressForm::lookup_error`] and leave the form editable; the
//! customer can always type city and state by hand.

pub mod postal;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use kirana_core::{strip_non_digits, MobileNumber, Pincode};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use postal::{PostalAddress, PostalLookupError, PostalResolver};

/// Quiet period after the last pincode keystroke before a lookup fires.
pub const LOOKUP_DEBOUNCE: Duration = Duration::from_millis(500);

/// Advisory message when the API has no data for the pincode.
pub const LOOKUP_NO_DATA_MESSAGE: &str = "Invalid pincode or no data found";

/// Advisory message when the lookup itself failed.
pub const LOOKUP_FAILED_MESSAGE: &str = "Failed to fetch pincode details";

/// The form's fields, addressable for edits and validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressField {
    Name,
    Mobile,
    HouseNumber,
    Area,
    Pincode,
    City,
    State,
}

impl AddressField {
    /// Lowercase human-readable field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Mobile => "mobile number",
            Self::HouseNumber => "house number",
            Self::Area => "area",
            Self::Pincode => "pincode",
            Self::City => "city",
            Self::State => "state",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current values of every form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub name: String,
    pub mobile: String,
    pub house_number: String,
    pub area: String,
    pub pincode: String,
    pub city: String,
    pub state: String,
}

/// Where the pincode lookup currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupStatus {
    /// No complete pincode entered, nothing pending.
    #[default]
    Idle,
    /// A 6-digit pincode is armed, waiting out the debounce.
    Debouncing,
    /// The request is on the wire.
    Fetching,
    /// City and state were filled from the lookup.
    Resolved,
    /// The lookup failed; see [`AddressForm::lookup_error`].
    Failed,
}

/// A validated address ready for checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    pub name: String,
    /// House number and area joined as one street line.
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: Pincode,
    pub phone: MobileNumber,
}

/// What a lookup task reports back, tagged with its generation.
enum LookupEvent {
    /// The debounce elapsed and the request went out.
    Started { generation: u64 },
    /// The request finished.
    Finished {
        generation: u64,
        result: Result<PostalAddress, PostalLookupError>,
    },
}

/// Address form state machine.
///
/// Lookup tasks run on the tokio runtime and report through an internal
/// channel. Callers either pump events with [`poll`](Self::poll) or block
/// on [`await_lookup`](Self::await_lookup) until the pending lookup
/// settles.
pub struct AddressForm<R = postal::PostalClient> {
    resolver: R,
    debounce: Duration,
    fields: AddressFields,
    field_errors: BTreeMap<AddressField, String>,
    status: LookupStatus,
    lookup_error: Option<String>,
    generation: u64,
    in_flight: Option<CancellationToken>,
    events_tx: UnboundedSender<LookupEvent>,
    events_rx: UnboundedReceiver<LookupEvent>,
}

impl<R: PostalResolver + Clone + 'static> AddressForm<R> {
    /// Create a form with the standard debounce.
    #[must_use]
    pub fn new(resolver: R) -> Self {
        Self::with_debounce(resolver, LOOKUP_DEBOUNCE)
    }

    /// Create a form with a custom debounce window.
    #[must_use]
    pub fn with_debounce(resolver: R, debounce: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            resolver,
            debounce,
            fields: AddressFields::default(),
            field_errors: BTreeMap::new(),
            status: LookupStatus::Idle,
            lookup_error: None,
            generation: 0,
            in_flight: None,
            events_tx,
            events_rx,
        }
    }

    /// Write a field value.
    ///
    /// Editing a field clears its validation error. Mobile and pincode
    /// input keeps digits only; a pincode edit additionally drives the
    /// lookup state machine.
    pub fn set_field(&mut self, field: AddressField, value: &str) {
        self.field_errors.remove(&field);
        match field {
            AddressField::Name => self.fields.name = value.to_owned(),
            AddressField::Mobile => self.fields.mobile = strip_non_digits(value),
            AddressField::HouseNumber => self.fields.house_number = value.to_owned(),
            AddressField::Area => self.fields.area = value.to_owned(),
            AddressField::Pincode => self.pincode_changed(strip_non_digits(value)),
            AddressField::City => self.fields.city = value.to_owned(),
            AddressField::State => self.fields.state = value.to_owned(),
        }
    }

    /// Shorthand for [`set_field`](Self::set_field) on the pincode.
    pub fn set_pincode(&mut self, raw: &str) {
        self.set_field(AddressField::Pincode, raw);
    }

    fn pincode_changed(&mut self, digits: String) {
        if digits == self.fields.pincode {
            return;
        }
        self.fields.pincode = digits;

        // A new value makes any outstanding lookup stale
        self.generation = self.generation.wrapping_add(1);
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }

        if self.fields.pincode.len() == Pincode::LENGTH {
            self.status = LookupStatus::Debouncing;
            self.spawn_lookup();
        } else {
            // Incomplete pincode: autofilled location is no longer trusted
            self.fields.city.clear();
            self.fields.state.clear();
            self.status = LookupStatus::Idle;
        }
    }

    fn spawn_lookup(&mut self) {
        let Ok(pincode) = Pincode::parse(&self.fields.pincode) else {
            // Unreachable after the length-and-digits gate above
            self.status = LookupStatus::Idle;
            return;
        };

        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());

        let resolver = self.resolver.clone();
        let events = self.events_tx.clone();
        let generation = self.generation;
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => return,
                () = tokio::time::sleep(debounce) => {}
            }

            let _ = events.send(LookupEvent::Started { generation });
            let result = resolver.resolve(&pincode).await;
            if token.is_cancelled() {
                return;
            }
            let _ = events.send(LookupEvent::Finished { generation, result });
        });
    }

    /// Apply any lookup events that have arrived. Non-blocking.
    pub fn poll(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    /// Wait until no lookup is pending, applying events as they arrive.
    ///
    /// Returns immediately when the form is not debouncing or fetching.
    pub async fn await_lookup(&mut self) {
        while matches!(self.status, LookupStatus::Debouncing | LookupStatus::Fetching) {
            match self.events_rx.recv().await {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }

    fn apply(&mut self, event: LookupEvent) {
        match event {
            LookupEvent::Started { generation } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "discarding stale lookup start");
                    return;
                }
                self.lookup_error = None;
                self.status = LookupStatus::Fetching;
            }
            LookupEvent::Finished { generation, result } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "discarding stale lookup result");
                    return;
                }
                match result {
                    Ok(address) => {
                        self.fields.city = address.city;
                        self.fields.state = address.state;
                        self.status = LookupStatus::Resolved;
                    }
                    Err(err) => {
                        debug!(error = %err, "pincode lookup failed");
                        self.lookup_error = Some(match err {
                            PostalLookupError::NoRecords { .. } => {
                                LOOKUP_NO_DATA_MESSAGE.to_owned()
                            }
                            _ => LOOKUP_FAILED_MESSAGE.to_owned(),
                        });
                        self.fields.city.clear();
                        self.fields.state.clear();
                        self.status = LookupStatus::Failed;
                    }
                }
            }
        }
    }

    /// Check every field, rebuilding the validation error map.
    ///
    /// Returns whether the form is submittable.
    pub fn validate(&mut self) -> bool {
        let mut errors = BTreeMap::new();
        let fields = &self.fields;

        if fields.name.trim().is_empty() {
            errors.insert(AddressField::Name, "Name is required.".to_owned());
        }
        if MobileNumber::parse(fields.mobile.trim()).is_err() {
            errors.insert(
                AddressField::Mobile,
                "Enter a valid 10-digit number.".to_owned(),
            );
        }
        if fields.house_number.trim().is_empty() {
            errors.insert(
                AddressField::HouseNumber,
                "House number is required.".to_owned(),
            );
        }
        if fields.area.trim().is_empty() {
            errors.insert(AddressField::Area, "Area is required.".to_owned());
        }
        if Pincode::parse(fields.pincode.trim()).is_err() {
            errors.insert(AddressField::Pincode, "Pincode must be 6 digits.".to_owned());
        }
        if fields.city.trim().is_empty() {
            errors.insert(AddressField::City, "City is required.".to_owned());
        }
        if fields.state.trim().is_empty() {
            errors.insert(AddressField::State, "State is required.".to_owned());
        }

        self.field_errors = errors;
        self.field_errors.is_empty()
    }

    /// Validate and assemble the shipping address.
    ///
    /// On `None` the per-field errors are available via
    /// [`errors`](Self::errors).
    pub fn shipping_address(&mut self) -> Option<ShippingAddress> {
        if !self.validate() {
            return None;
        }
        let pincode = Pincode::parse(self.fields.pincode.trim()).ok()?;
        let phone = MobileNumber::parse(self.fields.mobile.trim()).ok()?;

        Some(ShippingAddress {
            name: self.fields.name.trim().to_owned(),
            street: format!(
                "{}, {}",
                self.fields.house_number.trim(),
                self.fields.area.trim()
            ),
            city: self.fields.city.trim().to_owned(),
            state: self.fields.state.trim().to_owned(),
            pincode,
            phone,
        })
    }

    /// Current field values.
    #[must_use]
    pub const fn fields(&self) -> &AddressFields {
        &self.fields
    }

    /// Validation errors from the last [`validate`](Self::validate) call,
    /// minus any cleared by later edits.
    #[must_use]
    pub const fn errors(&self) -> &BTreeMap<AddressField, String> {
        &self.field_errors
    }

    /// Where the pincode lookup stands.
    #[must_use]
    pub const fn status(&self) -> LookupStatus {
        self.status
    }

    /// Advisory message from the last failed lookup, cleared when the
    /// next request goes out.
    #[must_use]
    pub fn lookup_error(&self) -> Option<&str> {
        self.lookup_error.as_deref()
    }

    /// Whether a request is on the wire right now.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        matches!(self.status, LookupStatus::Fetching)
    }
}

impl<R> Drop for AddressForm<R> {
    fn drop(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;

    #[derive(Clone, Copy)]
    enum Outcome {
        Found {
            city: &'static str,
            state: &'static str,
        },
        NoRecords,
        Transport,
    }

    /// Resolver scripted per pincode, recording every call. An optional
    /// gate holds responses until the test releases them.
    #[derive(Clone)]
    struct ScriptedResolver {
        outcomes: Arc<HashMap<String, Outcome>>,
        calls: Arc<Mutex<Vec<String>>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedResolver {
        fn new(outcomes: &[(&str, Outcome)]) -> Self {
            Self {
                outcomes: Arc::new(
                    outcomes
                        .iter()
                        .map(|(pin, outcome)| ((*pin).to_owned(), *outcome))
                        .collect(),
                ),
                calls: Arc::new(Mutex::new(Vec::new())),
                gate: None,
            }
        }

        fn gated(outcomes: &[(&str, Outcome)], gate: Arc<Notify>) -> Self {
            let mut resolver = Self::new(outcomes);
            resolver.gate = Some(gate);
            resolver
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PostalResolver for ScriptedResolver {
        async fn resolve(&self, pincode: &Pincode) -> Result<PostalAddress, PostalLookupError> {
            self.calls.lock().unwrap().push(pincode.as_str().to_owned());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.outcomes.get(pincode.as_str()) {
                Some(Outcome::Found { city, state }) => Ok(PostalAddress {
                    city: (*city).to_owned(),
                    state: (*state).to_owned(),
                }),
                Some(Outcome::Transport) => Err(PostalLookupError::Status { status: 500 }),
                Some(Outcome::NoRecords) | None => Err(PostalLookupError::NoRecords {
                    pincode: pincode.as_str().to_owned(),
                }),
            }
        }
    }

    fn mumbai() -> &'static [(&'static str, Outcome)] {
        &[
            (
                "400001",
                Outcome::Found {
                    city: "Mumbai",
                    state: "Maharashtra",
                },
            ),
            (
                "400002",
                Outcome::Found {
                    city: "Mumbai GPO",
                    state: "Maharashtra",
                },
            ),
        ]
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_rapid_edits_collapse_to_one_lookup() {
        let resolver = ScriptedResolver::new(mumbai());
        let mut form = AddressForm::new(resolver.clone());

        form.set_pincode("400001");
        tokio::time::advance(Duration::from_millis(100)).await;
        form.set_pincode("400002");
        form.await_lookup().await;

        assert_eq!(resolver.calls(), vec!["400002".to_owned()]);
        assert_eq!(form.fields().city, "Mumbai GPO");
        assert_eq!(form.fields().state, "Maharashtra");
        assert_eq!(form.status(), LookupStatus::Resolved);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_lookup_waits_out_the_debounce() {
        let resolver = ScriptedResolver::new(mumbai());
        let mut form = AddressForm::new(resolver.clone());

        form.set_pincode("400001");
        tokio::time::advance(Duration::from_millis(499)).await;
        form.poll();
        assert!(resolver.calls().is_empty());
        assert_eq!(form.status(), LookupStatus::Debouncing);

        form.await_lookup().await;
        assert_eq!(resolver.calls(), vec!["400001".to_owned()]);
        assert_eq!(form.fields().city, "Mumbai");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_stale_response_never_lands_after_clear() {
        let gate = Arc::new(Notify::new());
        let resolver = ScriptedResolver::gated(
            &[(
                "110001",
                Outcome::Found {
                    city: "New Delhi",
                    state: "Delhi",
                },
            )],
            Arc::clone(&gate),
        );
        let mut form = AddressForm::new(resolver.clone());

        form.set_pincode("110001");
        tokio::time::sleep(Duration::from_millis(600)).await;
        form.poll();
        assert_eq!(form.status(), LookupStatus::Fetching);
        assert_eq!(resolver.calls(), vec!["110001".to_owned()]);

        // Pincode cleared while the request is still in the air
        form.set_pincode("");
        assert_eq!(form.status(), LookupStatus::Idle);

        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(1)).await;
        form.poll();

        assert_eq!(form.fields().city, "");
        assert_eq!(form.fields().state, "");
        assert_eq!(form.status(), LookupStatus::Idle);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_stale_generation_events_are_discarded() {
        let mut form = AddressForm::new(ScriptedResolver::new(mumbai()));
        form.set_pincode("400001");

        // A result from a generation that no longer matches is dropped
        form.events_tx
            .send(LookupEvent::Finished {
                generation: 0,
                result: Ok(PostalAddress {
                    city: "Stale City".to_owned(),
                    state: "Stale State".to_owned(),
                }),
            })
            .unwrap();
        form.poll();
        assert_eq!(form.fields().city, "");
        assert_eq!(form.status(), LookupStatus::Debouncing);

        // The current generation still applies
        form.events_tx
            .send(LookupEvent::Finished {
                generation: form.generation,
                result: Ok(PostalAddress {
                    city: "Mumbai".to_owned(),
                    state: "Maharashtra".to_owned(),
                }),
            })
            .unwrap();
        form.poll();
        assert_eq!(form.fields().city, "Mumbai");
        assert_eq!(form.status(), LookupStatus::Resolved);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_incomplete_pincode_clears_location_immediately() {
        let resolver = ScriptedResolver::new(mumbai());
        let mut form = AddressForm::new(resolver);

        form.set_pincode("400001");
        form.await_lookup().await;
        assert_eq!(form.fields().city, "Mumbai");

        form.set_pincode("40000");
        assert_eq!(form.fields().city, "");
        assert_eq!(form.fields().state, "");
        assert_eq!(form.status(), LookupStatus::Idle);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_retyping_same_pincode_does_not_refetch() {
        let resolver = ScriptedResolver::new(mumbai());
        let mut form = AddressForm::new(resolver.clone());

        form.set_pincode("400001");
        form.await_lookup().await;
        assert_eq!(resolver.calls().len(), 1);

        form.set_pincode("400001");
        assert_eq!(form.status(), LookupStatus::Resolved);
        form.await_lookup().await;
        assert_eq!(resolver.calls().len(), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_no_records_shows_advisory_and_clears_location() {
        let resolver = ScriptedResolver::new(&[("999999", Outcome::NoRecords)]);
        let mut form = AddressForm::new(resolver);

        form.set_field(AddressField::City, "Typed City");
        form.set_pincode("999999");
        form.await_lookup().await;

        assert_eq!(form.status(), LookupStatus::Failed);
        assert_eq!(form.lookup_error(), Some(LOOKUP_NO_DATA_MESSAGE));
        assert_eq!(form.fields().city, "");
        assert_eq!(form.fields().state, "");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_transport_failure_shows_fetch_error() {
        let resolver = ScriptedResolver::new(&[("400001", Outcome::Transport)]);
        let mut form = AddressForm::new(resolver);

        form.set_pincode("400001");
        form.await_lookup().await;

        assert_eq!(form.status(), LookupStatus::Failed);
        assert_eq!(form.lookup_error(), Some(LOOKUP_FAILED_MESSAGE));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_next_lookup_clears_previous_error() {
        let resolver = ScriptedResolver::new(&[
            ("999999", Outcome::NoRecords),
            (
                "400001",
                Outcome::Found {
                    city: "Mumbai",
                    state: "Maharashtra",
                },
            ),
        ]);
        let mut form = AddressForm::new(resolver);

        form.set_pincode("999999");
        form.await_lookup().await;
        assert!(form.lookup_error().is_some());

        form.set_pincode("400001");
        form.await_lookup().await;
        assert!(form.lookup_error().is_none());
        assert_eq!(form.status(), LookupStatus::Resolved);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_mobile_and_pincode_keep_digits_only() {
        let mut form = AddressForm::new(ScriptedResolver::new(mumbai()));

        form.set_field(AddressField::Mobile, "98765 43210");
        assert_eq!(form.fields().mobile, "9876543210");

        form.set_pincode("400-001");
        assert_eq!(form.fields().pincode, "400001");
        assert_eq!(form.status(), LookupStatus::Debouncing);
    }

    fn message(form: &AddressForm<ScriptedResolver>, field: AddressField) -> Option<&str> {
        form.errors().get(&field).map(String::as_str)
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let mut form = AddressForm::new(ScriptedResolver::new(&[]));
        assert!(!form.validate());

        assert_eq!(form.errors().len(), 7);
        assert_eq!(message(&form, AddressField::Name), Some("Name is required."));
        assert_eq!(
            message(&form, AddressField::Mobile),
            Some("Enter a valid 10-digit number.")
        );
        assert_eq!(
            message(&form, AddressField::HouseNumber),
            Some("House number is required.")
        );
        assert_eq!(message(&form, AddressField::Area), Some("Area is required."));
        assert_eq!(
            message(&form, AddressField::Pincode),
            Some("Pincode must be 6 digits.")
        );
        assert_eq!(message(&form, AddressField::City), Some("City is required."));
        assert_eq!(
            message(&form, AddressField::State),
            Some("State is required.")
        );
    }

    #[test]
    fn test_validate_rejects_short_mobile() {
        let mut form = AddressForm::new(ScriptedResolver::new(&[]));
        form.set_field(AddressField::Mobile, "12345");
        form.validate();
        assert_eq!(
            form.errors().get(&AddressField::Mobile),
            Some(&"Enter a valid 10-digit number.".to_owned())
        );
    }

    #[test]
    fn test_editing_a_field_clears_its_error() {
        let mut form = AddressForm::new(ScriptedResolver::new(&[]));
        form.validate();
        assert!(form.errors().contains_key(&AddressField::Name));

        form.set_field(AddressField::Name, "Asha");
        assert!(!form.errors().contains_key(&AddressField::Name));
        assert!(form.errors().contains_key(&AddressField::Area));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_shipping_address_joins_house_and_area() {
        let resolver = ScriptedResolver::new(&[(
            "560041",
            Outcome::Found {
                city: "Bengaluru",
                state: "Karnataka",
            },
        )]);
        let mut form = AddressForm::new(resolver);

        form.set_field(AddressField::Name, "  Asha Rao  ");
        form.set_field(AddressField::Mobile, "9876543210");
        form.set_field(AddressField::HouseNumber, "12/4");
        form.set_field(AddressField::Area, "Jayanagar 4th Block");
        form.set_pincode("560041");
        form.await_lookup().await;

        let address = form.shipping_address().unwrap();
        assert_eq!(address.name, "Asha Rao");
        assert_eq!(address.street, "12/4, Jayanagar 4th Block");
        assert_eq!(address.city, "Bengaluru");
        assert_eq!(address.state, "Karnataka");
        assert_eq!(address.pincode.as_str(), "560041");
        assert_eq!(address.phone.as_str(), "9876543210");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_shipping_address_none_when_invalid() {
        let mut form = AddressForm::new(ScriptedResolver::new(&[]));
        form.set_field(AddressField::Name, "Asha");

        assert!(form.shipping_address().is_none());
        assert!(form.errors().contains_key(&AddressField::Mobile));
    }
}
