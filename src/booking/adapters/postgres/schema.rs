//! Diesel schema for booking persistence.

diesel::table! {
    /// Service booking records.
    service_bookings (id) {
        /// Booking identifier.
        id -> Uuid,
        /// Customer who requested the service.
        customer_id -> Uuid,
        /// Tractor the service concerns.
        tractor_id -> Nullable<Uuid>,
        /// Requested service.
        #[max_length = 255]
        service_type -> Varchar,
        /// Customer description.
        description -> Nullable<Text>,
        /// Scheduled service date.
        scheduled_date -> Timestamptz,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Assigned service provider.
        service_provider_id -> Nullable<Uuid>,
        /// Provider and admin notes.
        notes -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tractor ownership mirrored from the equipment registry.
    tractors (id) {
        id -> Uuid,
        owner_id -> Uuid,
    }
}
