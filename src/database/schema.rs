// SQL schema for the onboarding database

pub const OTP_CODES_SCHEMA: &str = include_str!("../../migrations/001_otp_codes.sql");
pub const REGISTRATIONS_SCHEMA: &str = include_str!("../../migrations/002_registrations.sql");

pub const MIGRATIONS: &[(&str, &str)] = &[
    ("001_otp_codes", OTP_CODES_SCHEMA),
    ("002_registrations", REGISTRATIONS_SCHEMA),
];
