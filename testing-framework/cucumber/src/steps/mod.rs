mod chaincode;
mod channels;
mod clients;
mod log;
