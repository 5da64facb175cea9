mod helpers;
mod unsubscribe;
