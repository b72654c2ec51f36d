pub mod form_args;
