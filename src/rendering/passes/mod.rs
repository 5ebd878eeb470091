pub mod lambert_pass;
