mod commit;
mod decided;
mod prepare;
mod proposal;
mod round_change;
mod timeout;
