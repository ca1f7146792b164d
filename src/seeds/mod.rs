pub mod motivational_messages_seed;
